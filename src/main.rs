//! Command-line front-end for the Scholarly engine. Each subcommand maps to
//! one user action of the desktop workflow: open or close a student file,
//! manage awards, and list the recipients an award selects.
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scholarly::{AwardCriteriaRecord, Scholarly, SortKey, StoreConfig, StudentRecord};
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "scholarly")]
#[command(about = "Select scholarship recipients from student records", long_about = None)]
struct Cli {
    /// SQLite database file (default: ~/.scholarly/scholarly.sqlite)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a student CSV, replacing any open student data
    Open {
        csv: PathBuf,
    },

    /// Discard the loaded student data
    Close,

    /// List every student, highest GPA first
    Students {
        #[arg(long)]
        json: bool,
    },

    /// Save the loaded students to a CSV file
    Export {
        csv: PathBuf,
    },

    /// Manage award criteria
    Awards {
        #[command(subcommand)]
        command: AwardCommands,
    },

    /// List the recipients selected by an award
    Select {
        award: String,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum AwardCommands {
    /// List every award
    List,

    /// Show one award
    Show { name: String },

    /// Load award definitions from a JSON file
    Load { file: PathBuf },

    /// Add a new award
    Add {
        name: String,

        /// Criteria object, e.g. '{"cum_gpa": {"$gte": 3.5}}'
        #[arg(short, long, default_value = "{}")]
        criteria: String,

        /// Maximum number of recipients (0 = no limit)
        #[arg(short, long, default_value_t = 0)]
        limit: u32,

        /// Sort pairs, e.g. '[["cum_gpa", -1]]'
        #[arg(short, long)]
        sort: Option<String>,
    },

    /// Delete an award
    Delete { name: String },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "scholarly=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match cli.database {
        Some(path) => StoreConfig::new(path),
        None => StoreConfig::default_location().context("failed to locate database")?,
    };
    let scholarly = Scholarly::new(config);

    match cli.command {
        Commands::Open { csv } => {
            let students = scholarly
                .open_file(&csv)
                .with_context(|| format!("failed to open {}", csv.display()))?;
            print_students(&students, false)?;
        }
        Commands::Close => {
            scholarly.close_file().context("failed to close student data")?;
        }
        Commands::Students { json } => {
            let students = scholarly
                .students()
                .select_all()
                .context("failed to load students")?;
            print_students(&students, json)?;
        }
        Commands::Export { csv } => {
            let rows = scholarly
                .students()
                .export_csv(&csv)
                .with_context(|| format!("failed to write {}", csv.display()))?;
            println!("Wrote {rows} students to {}", csv.display());
        }
        Commands::Awards { command } => run_award_command(&scholarly, command)?,
        Commands::Select { award, json } => {
            let recipients = scholarly
                .select_recipients(&award)
                .with_context(|| format!("failed to select recipients for '{award}'"))?;
            print_students(&recipients, json)?;
        }
    }

    Ok(())
}

fn run_award_command(scholarly: &Scholarly, command: AwardCommands) -> Result<()> {
    let awards = scholarly.awards();
    match command {
        AwardCommands::List => {
            for award in awards.get_all().context("failed to load awards")? {
                println!("{award}");
            }
        }
        AwardCommands::Show { name } => match awards.get_by_name(&name)? {
            Some(award) => println!("{}", serde_json::to_string_pretty(&award.to_map())?),
            None => bail!("no award named '{name}'"),
        },
        AwardCommands::Load { file } => {
            let count = awards
                .load_definitions_file(&file)
                .with_context(|| format!("failed to load {}", file.display()))?;
            println!("Loaded {count} awards");
        }
        AwardCommands::Add {
            name,
            criteria,
            limit,
            sort,
        } => {
            let criteria: Map<String, Value> =
                serde_json::from_str(&criteria).context("criteria must be a JSON object")?;
            let sort: Vec<SortKey> = match sort {
                Some(text) => serde_json::from_str(&text)
                    .context("sort must be a list of [field, 1 | -1] pairs")?,
                None => Vec::new(),
            };
            let award = AwardCriteriaRecord::new(name, criteria)
                .with_limit(limit)
                .with_sort(sort);
            let award = awards.insert(award).context("failed to add award")?;
            println!("Added {}", award.name);
        }
        AwardCommands::Delete { name } => {
            if !awards.delete(&name)? {
                println!("No award named '{name}'");
            }
        }
    }
    Ok(())
}

fn print_students(students: &[StudentRecord], json: bool) -> Result<()> {
    if json {
        let rows: Vec<Value> = students
            .iter()
            .map(|student| Value::Object(student.to_map()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{}", StudentRecord::headers().join("\t"));
    for student in students {
        let row: Vec<String> = student.fields().map(|(_, value)| value.to_string()).collect();
        println!("{}", row.join("\t"));
    }
    Ok(())
}
