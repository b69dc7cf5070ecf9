//! Claimlens CLI - end-to-end portfolio analysis run
//!
//! Load, clean, explore, test, model, and explain an insurance claims
//! portfolio, writing charts and a JSON export alongside the terminal
//! report.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;

use claimlens::cli::Cli;
use claimlens::model::{
    BoostParams, FeatureInterpreter, FittedModel, ForestParams, ModelTrainer,
};
use claimlens::pipeline::{
    bivariate_summary, convert_types, descriptive_statistics, handle_missing, loss_ratios,
    missing_report, CleanConfig, FeatureEngineer, HypothesisTester, PolicyStore, TestOutcome,
};
use claimlens::report::{
    self, AttributionExport, ModelEvaluations, RunExport, RunMetadata, RunSummary,
};
use claimlens::utils::{
    create_progress_bar, create_spinner, finish_with_success, print_banner, print_completion,
    print_config, print_info, print_step_header, print_step_time, print_success, print_warning,
};
use claimlens::{plot, report::tables};

/// Numeric columns summarized during EDA.
const NUMERIC_SUMMARY_COLS: [&str; 4] = [
    "TotalPremium",
    "TotalClaims",
    "CustomValueEstimate",
    "SumInsured",
];

fn main() -> Result<()> {
    let cli = Cli::parse();

    let input = cli.input.clone().ok_or_else(|| {
        anyhow::anyhow!("Input file is required. Use -i/--input to specify a file.")
    })?;

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&input, &cli.output_dir, &cli.segments, cli.test_size);

    let mut summary = RunSummary::default();

    // Step 1: Load the portfolio
    print_step_header(1, "Load Portfolio");
    let step_start = Instant::now();
    let mut store = PolicyStore::new(Some(input.clone()));
    let raw = store.load()?;
    let (rows, cols) = raw.shape();
    summary.rows = rows;
    summary.initial_columns = cols;
    print_success("Portfolio loaded");
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!(
        "      Estimated memory: {:.2} MB",
        raw.estimated_size() as f64 / (1024.0 * 1024.0)
    );
    print_step_time(step_start.elapsed());

    // Step 2: Clean and type the data
    print_step_header(2, "Preprocess");
    let step_start = Instant::now();
    let spinner = create_spinner("Converting column types...");
    let typed = convert_types(&raw)?;
    finish_with_success(&spinner, "Column types converted");

    let missing = missing_report(&typed);
    if missing.is_empty() {
        print_info("No missing values found");
    } else {
        print_info(&format!("{} column(s) with missing values", missing.len()));
        tables::print_indented(&tables::missing_table(&missing));
    }

    let clean_config = CleanConfig {
        remap_zero_custom_value: cli.remap_zero_custom_value,
    };
    let clean = handle_missing(&typed, &clean_config)?;
    summary.cleaned_columns = clean.width();
    print_success("Missing-value policy applied");

    if let Some(path) = &cli.save_cleaned {
        store.set_data(clean.clone());
        store.save(path)?;
        print_success(&format!("Cleaned dataset saved to {}", path.display()));
    }
    print_step_time(step_start.elapsed());

    // Step 3: Exploratory analysis
    print_step_header(3, "Exploratory Analysis");
    let step_start = Instant::now();

    let (_, variability) = descriptive_statistics(&clean, &NUMERIC_SUMMARY_COLS)?;
    tables::print_indented(&tables::variability_table(&variability));

    let segments: Vec<&str> = cli.segments.iter().map(|s| s.as_str()).collect();
    let loss_report = loss_ratios(&clean, &segments)?;
    println!(
        "      Overall loss ratio: {}",
        style(format!("{:.2}%", loss_report.overall * 100.0)).yellow().bold()
    );

    let spinner = create_spinner("Computing bivariate summaries...");
    let bivariate = bivariate_summary(&clean)?;
    finish_with_success(&spinner, "Bivariate summaries ready");
    print_info(&format!(
        "{} month(s), {} make(s) with claims, {} postal-code correlation(s)",
        bivariate.monthly.len(),
        bivariate.make_severity.len(),
        bivariate.zip_correlations.len()
    ));

    if !cli.no_plots {
        for segment in &loss_report.segments {
            let path = cli
                .output_dir
                .join(format!("loss_ratio_{}.png", segment.column.to_lowercase()));
            plot::loss_ratio_chart(segment, loss_report.overall, &path)?;
            summary.plots_written += 1;
        }
        if !bivariate.monthly.is_empty() {
            plot::monthly_trend_chart(&bivariate.monthly, &cli.output_dir.join("monthly_trends.png"))?;
            summary.plots_written += 1;
        }
        if !bivariate.zip_correlations.is_empty() {
            plot::zip_correlation_chart(
                &bivariate.zip_correlations,
                &cli.output_dir.join("zip_correlations.png"),
            )?;
            summary.plots_written += 1;
        }
        print_success("EDA charts written");
    }
    print_step_time(step_start.elapsed());

    // Step 4: Hypothesis tests
    print_step_header(4, "Hypothesis Tests");
    let step_start = Instant::now();

    let ready = HypothesisTester::new(clean.clone()).calculate_metrics()?;
    let kpis = ready.metrics().clone();
    tables::print_indented(&tables::kpi_table(&kpis));

    let mut outcomes: Vec<TestOutcome> = Vec::new();
    let mut record = |label: &str, result: Result<TestOutcome>| match result {
        Ok(outcome) => outcomes.push(outcome),
        Err(err) => print_warning(&format!("{label} skipped: {err}")),
    };

    record("province risk test", ready.test_province_risk());
    match (&cli.zip_a, &cli.zip_b) {
        (Some(a), Some(b)) => {
            record("zip-code risk test", ready.test_zipcode_risk(a, b));
            record("zip-code margin test", ready.test_zipcode_margin(a, b));
        }
        _ => print_info("Zip-code tests skipped (provide --zip-a and --zip-b)"),
    }
    match ready.test_gender_risk() {
        Ok((frequency, severity)) => {
            outcomes.push(frequency);
            outcomes.push(severity);
        }
        Err(err) => print_warning(&format!("gender risk test skipped: {err}")),
    }

    if !outcomes.is_empty() {
        tables::print_indented(&tables::test_table(&outcomes.iter().collect::<Vec<_>>()));
        for outcome in &outcomes {
            print_info(&outcome.interpretation);
        }
    }
    summary.tests_run = outcomes.len();
    summary.tests_rejected = outcomes.iter().filter(|o| o.reject_null).count();
    print_step_time(step_start.elapsed());

    // Step 5: Feature engineering
    print_step_header(5, "Feature Engineering");
    let step_start = Instant::now();
    let spinner = create_spinner("Encoding features and splitting...");
    let mut engineer = FeatureEngineer::new(clean.clone());
    engineer.create_features()?;
    let data = engineer.prepare_modeling_data(cli.test_size)?;
    summary.encoded_features = data.x_train.n_cols();
    finish_with_success(&spinner, "Modeling data prepared");
    print_info(&format!(
        "{} encoded features; train/test = {}/{}; severity subset = {}/{}",
        data.x_train.n_cols(),
        data.x_train.n_rows(),
        data.x_test.n_rows(),
        data.x_sev_train.n_rows(),
        data.x_sev_test.n_rows()
    ));
    print_step_time(step_start.elapsed());

    // Step 6: Model training and evaluation
    print_step_header(6, "Train & Evaluate Models");
    let step_start = Instant::now();

    let mut classification = Vec::new();
    let mut regression = Vec::new();
    let mut interpreted: Option<FittedModel> = None;

    let frequency_trainer = ModelTrainer::new(
        data.x_train,
        data.x_test,
        data.y_freq_train,
        data.y_freq_test,
    );

    let pb = create_progress_bar(6, "Training models");
    let classifiers: Vec<(&str, Result<FittedModel>)> = vec![
        (
            "Logistic Regression",
            frequency_trainer.train_logistic_regression(),
        ),
        (
            "Random Forest Classifier",
            frequency_trainer.train_random_forest_classifier(ForestParams::default()),
        ),
        (
            "Gradient Boosted Classifier",
            frequency_trainer.train_gradient_boosted_classifier(BoostParams::default()),
        ),
    ];
    for (name, trained) in classifiers {
        pb.inc(1);
        match trained {
            Ok(model) => {
                let report = frequency_trainer.evaluate_classification(&model)?;
                classification.push((name.to_string(), report));
                summary.models_trained += 1;
                // The boosted classifier is what gets interpreted below.
                if matches!(model, FittedModel::BoostedClassifier(_)) {
                    interpreted = Some(model);
                }
            }
            Err(err) => print_warning(&format!("{name} skipped: {err}")),
        }
    }

    let severity_rows = data.y_sev_train.len();
    if severity_rows >= 2 && !data.y_sev_test.is_empty() {
        let severity_trainer = ModelTrainer::new(
            data.x_sev_train,
            data.x_sev_test,
            data.y_sev_train,
            data.y_sev_test,
        );
        let regressors: Vec<(&str, Result<FittedModel>)> = vec![
            (
                "Linear Regression",
                severity_trainer.train_linear_regression(),
            ),
            (
                "Random Forest Regressor",
                severity_trainer.train_random_forest_regressor(ForestParams::default()),
            ),
            (
                "Gradient Boosted Regressor",
                severity_trainer.train_gradient_boosted_regressor(BoostParams::default()),
            ),
        ];
        for (name, trained) in regressors {
            pb.inc(1);
            match trained {
                Ok(model) => {
                    let report = severity_trainer.evaluate_regression(&model)?;
                    regression.push((name.to_string(), report));
                    summary.models_trained += 1;
                }
                Err(err) => print_warning(&format!("{name} skipped: {err}")),
            }
        }
    } else {
        pb.inc(3);
        print_warning(&format!(
            "severity task skipped: only {severity_rows} positive-claim training row(s)"
        ));
    }
    finish_with_success(&pb, "Model training complete");

    if !classification.is_empty() {
        tables::print_indented(&tables::classification_table(&classification));
    }
    if !regression.is_empty() {
        tables::print_indented(&tables::regression_table(&regression));
    }
    print_step_time(step_start.elapsed());

    // Step 7: Feature attribution
    print_step_header(7, "Feature Attribution");
    let step_start = Instant::now();

    let mut attribution_export = None;
    if let Some(model) = &interpreted {
        let mut interpreter = FeatureInterpreter::new(model, frequency_trainer.x_test());
        if !cli.no_plots {
            interpreter = interpreter.with_plot_dir(&cli.output_dir);
        }
        let attribution = interpreter.attribution_summary(cli.top_n)?;
        tables::print_indented(&tables::attribution_table(&attribution.table));
        if !cli.no_plots {
            summary.plots_written += 1;
            print_success("Attribution chart written");
        }
        attribution_export = Some(AttributionExport {
            model: model.name().to_string(),
            strategy: attribution.strategy.to_string(),
            top_features: attribution.table,
        });
    } else {
        print_warning("no interpretable model available");
    }
    print_step_time(step_start.elapsed());

    // Export run artifacts
    let export = RunExport {
        metadata: RunMetadata::new(
            env!("CARGO_PKG_VERSION"),
            input.display().to_string(),
            cli.test_size,
        ),
        missing,
        loss_ratios: loss_report,
        bivariate,
        kpis,
        tests: outcomes,
        evaluations: ModelEvaluations {
            classification,
            regression,
        },
        attribution: attribution_export,
    };
    let export_path = cli.output_dir.join("run_export.json");
    report::write_export(&export, &export_path)?;
    print_success(&format!("Run export written to {}", export_path.display()));

    summary.display();
    print_completion();

    Ok(())
}
