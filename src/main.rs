use std::path::Path;

use serde::Serialize;
use tracing_subscriber::EnvFilter;

use schemajudge::cli::{Cli, Commands, EngineArgs, OutputFormat};
use schemajudge::config::GraderConfig;
use schemajudge::grading::{builtin_problem, builtin_problems, Harness, Problem, Report, VisualSchema};
use schemajudge::storage::table::ResultSet;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("schemajudge=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();
    let config = match &cli.config {
        Some(path) => GraderConfig::from_path(path)?,
        None => GraderConfig::default(),
    };

    match &cli.command {
        Commands::List => list_problems(cli.format),
        Commands::Ddl { schema } => {
            print!("{}", VisualSchema::from_path(schema)?.to_ddl());
            Ok(())
        }
        Commands::Grade {
            schema,
            problem,
            query,
            engine,
        } => grade(config, engine, schema, problem, query, cli.format),
        Commands::Query {
            schema,
            problem,
            test,
            sql,
            engine,
        } => run_query(config, engine, schema, problem.as_deref(), *test, sql, cli.format),
    }
}

fn load_problem(id_or_path: &str) -> Result<Problem, Box<dyn std::error::Error>> {
    match id_or_path.parse::<u32>() {
        Ok(id) => builtin_problem(id)?.ok_or_else(|| format!("No built-in problem with id {}", id).into()),
        Err(_) => Ok(Problem::from_path(id_or_path)?),
    }
}

fn list_problems(format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let problems = builtin_problems()?;
    let result = ResultSet {
        columns: vec!["id".into(), "title".into(), "difficulty".into(), "points".into()],
        values: problems
            .iter()
            .map(|p| {
                vec![
                    i64::from(p.id).into(),
                    p.title.as_str().into(),
                    p.difficulty.to_string().into(),
                    i64::from(p.total_points()).into(),
                ]
            })
            .collect(),
    };
    print_result(&result, format)
}

fn grade(
    mut config: GraderConfig,
    engine: &EngineArgs,
    schema: &Path,
    problem: &str,
    submitted: &[String],
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    engine.apply(&mut config);
    let problem = load_problem(problem)?;
    let schema = VisualSchema::from_path(schema)?;

    let mut harness = Harness::from_config(&config);
    let report = harness.run_all(&problem, &schema, submitted)?;

    match format {
        OutputFormat::Table => print_report(&report),
        OutputFormat::Csv => print_csv(&report_rows(&report)),
        OutputFormat::Json => print_json(&GradeOutput {
            problem: problem.id,
            summary: report.to_string(),
            percentage: report.percentage(),
            report: &report,
        })?,
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GradeOutput<'a> {
    problem: u32,
    summary: String,
    percentage: u32,
    #[serde(flatten)]
    report: &'a Report,
}

fn run_query(
    mut config: GraderConfig,
    engine: &EngineArgs,
    schema: &Path,
    problem: Option<&str>,
    test: Option<usize>,
    sql: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    engine.apply(&mut config);
    let schema = VisualSchema::from_path(schema)?;

    let mut harness = Harness::from_config(&config);
    harness.load_schema(&schema)?;

    if let Some(problem) = problem {
        let problem = load_problem(problem)?;
        let index = test.unwrap_or(1);
        let query_test = index
            .checked_sub(1)
            .and_then(|i| problem.query_tests().nth(i))
            .ok_or_else(|| format!("Problem {} has no query test {}", problem.id, index))?;
        let default_table = schema
            .first_table()
            .unwrap_or(schemajudge::grading::harness::DEFAULT_SEED_TABLE);
        harness.seed(query_test, default_table)?;
    }

    let results = harness.session().exec(sql)?;
    match results.first() {
        Some(result) => print_result(result, format),
        None => {
            println!("(no result set)");
            Ok(())
        }
    }
}

fn print_result(result: &ResultSet, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Table => print_table(result),
        OutputFormat::Csv => print_csv(result),
        OutputFormat::Json => print_json(result)?,
    }
    Ok(())
}

fn report_rows(report: &Report) -> ResultSet {
    ResultSet {
        columns: vec![
            "name".into(),
            "passed".into(),
            "points".into(),
            "max_points".into(),
            "message".into(),
        ],
        values: report
            .results
            .iter()
            .map(|r| {
                vec![
                    r.name.as_str().into(),
                    r.passed.to_string().into(),
                    i64::from(r.points).into(),
                    i64::from(r.max_points).into(),
                    r.message.as_str().into(),
                ]
            })
            .collect(),
    }
}

fn print_report(report: &Report) {
    for (i, result) in report.results.iter().enumerate() {
        let mark = if result.passed { "PASS" } else { "FAIL" };
        println!(
            "{:>2}. [{}] {} ({}/{})",
            i + 1,
            mark,
            result.name,
            result.points,
            result.max_points
        );
        if let Some(query) = &result.query {
            println!("    query: {}", query);
        }
        println!("    {}", result.message);
    }
    println!();
    println!("{}", report);
}

fn print_table(result: &ResultSet) {
    if result.row_count() == 0 {
        println!("(0 rows)");
        return;
    }

    // Rows are not width-checked against their labels.
    let width_count = result
        .values
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(result.columns.len()))
        .max()
        .unwrap_or(0);

    let label = |i: usize| result.columns.get(i).map(String::as_str).unwrap_or("");

    // Calculate column widths
    let widths: Vec<usize> = (0..width_count)
        .map(|i| {
            let header_width = label(i).chars().count();
            let max_value_width = result
                .values
                .iter()
                .map(|row| row.get(i).map(|v| v.to_string().chars().count()).unwrap_or(0))
                .max()
                .unwrap_or(0);
            header_width.max(max_value_width)
        })
        .collect();

    let header: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &w)| format!("{:width$}", label(i), width = w))
        .collect();
    println!("{}", header.join(" | "));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("-+-"));

    for row in &result.values {
        let values: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let cell = row.get(i).map(|v| v.to_string()).unwrap_or_default();
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", values.join(" | "));
    }

    println!("({} rows)", result.row_count());
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn print_csv(result: &ResultSet) {
    let header: Vec<String> = result.columns.iter().map(|c| csv_field(c)).collect();
    println!("{}", header.join(","));

    for row in &result.values {
        let values: Vec<String> = row.iter().map(|v| csv_field(&v.to_string())).collect();
        println!("{}", values.join(","));
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
