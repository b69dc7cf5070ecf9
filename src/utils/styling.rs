//! Terminal styling helpers for the CLI run

use console::style;
use std::path::Path;
use std::time::Duration;

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
     ██████╗██╗      █████╗ ██╗███╗   ███╗██╗     ███████╗███╗   ██╗███████╗
    ██╔════╝██║     ██╔══██╗██║████╗ ████║██║     ██╔════╝████╗  ██║██╔════╝
    ██║     ██║     ███████║██║██╔████╔██║██║     █████╗  ██╔██╗ ██║███████╗
    ██║     ██║     ██╔══██║██║██║╚██╔╝██║██║     ██╔══╝  ██║╚██╗██║╚════██║
    ╚██████╗███████╗██║  ██║██║██║ ╚═╝ ██║███████╗███████╗██║ ╚████║███████║
     ╚═════╝╚══════╝╚═╝  ╚═╝╚═╝╚═╝     ╚═╝╚══════╝╚══════╝╚═╝  ╚═══╝╚══════╝
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {}",
        style("Insurance portfolio analytics and claim modeling").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
}

/// Print the run configuration card
pub fn print_config(input: &Path, output_dir: &Path, segments: &[String], test_size: f64) {
    println!();
    println!(
        "    {} {}",
        style("⚙").cyan(),
        style("Configuration").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!("      Input:      {}", input.display());
    println!("      Output dir: {}", output_dir.display());
    println!("      Segments:   {}", segments.join(", "));
    println!(
        "      Test size:  {}",
        style(format!("{:.0}%", test_size * 100.0)).yellow()
    );
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an informational message
pub fn print_info(message: &str) {
    println!("    {} {}", style("·").dim(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!(
        "    {} {}",
        style("!").yellow().bold(),
        style(message).yellow()
    );
}

/// Print elapsed time for a step
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {}",
        style(format!("took {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        style("✦").magenta().bold(),
        style("Analysis complete").white().bold()
    );
    println!();
}
