use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use zeroenv::report::{ConsoleReporter, Reporter};
use zeroenv::store::KEY_FILE;
use zeroenv::{Result, SecretStore, SecurityTier, ZeroEnvError};

#[derive(Parser)]
#[command(name = "zeroenv")]
#[command(about = "Git-safe secrets: encrypted key-value store for project secrets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a store in a directory (generates the master key)
    Init {
        /// Security tier: standard (fast), enhanced (100k iterations), max (500k iterations)
        #[arg(long, default_value = "standard")]
        tier: SecurityTier,
        /// Directory with ZeroEnv
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,
    },
    /// Add or update a secret (prompts when arguments are omitted)
    Add {
        name: Option<String>,
        value: Option<String>,
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,
    },
    /// Get the value of a secret
    Get {
        name: String,
        /// Only check existence, do not print the value
        #[arg(long)]
        no_show: bool,
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,
    },
    /// List all secrets
    Ls {
        /// Show decrypted values
        #[arg(long)]
        values: bool,
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,
    },
    /// Remove a secret
    Rm {
        name: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,
    },
    /// Run a command with secrets injected as environment variables
    Run {
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,
    },
    /// Export secrets as NAME=VALUE lines or JSON
    Export {
        #[arg(short, long, value_enum, default_value = "env")]
        format: ExportFormat,
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,
    },
    /// Show store configuration and security tier
    Info {
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Env,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let reporter = ConsoleReporter;

    match dispatch(cli.command, &reporter) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            reporter.error(&e.to_string());
            ExitCode::from(1)
        }
    }
}

fn dispatch(command: Commands, reporter: &dyn Reporter) -> Result<u8> {
    match command {
        Commands::Init { tier, directory } => cmd_init(&directory, tier, reporter),
        Commands::Add {
            name,
            value,
            directory,
        } => cmd_add(&directory, name, value, reporter),
        Commands::Get {
            name,
            no_show,
            directory,
        } => cmd_get(&directory, &name, no_show, reporter),
        Commands::Ls { values, directory } => cmd_ls(&directory, values, reporter),
        Commands::Rm {
            name,
            yes,
            directory,
        } => cmd_rm(&directory, &name, yes, reporter),
        Commands::Run { command, directory } => cmd_run(&directory, &command, reporter),
        Commands::Export { format, directory } => cmd_export(&directory, format),
        Commands::Info { directory } => cmd_info(&directory, reporter),
    }
}

fn cmd_init(directory: &Path, tier: SecurityTier, reporter: &dyn Reporter) -> Result<u8> {
    SecretStore::initialize(directory, tier)?;
    update_gitignore(directory, reporter);
    reporter.success(&format!(
        "Initialized ZeroEnv (tier: {tier}). Encrypted store is safe to commit; {KEY_FILE} stays local."
    ));
    Ok(0)
}

/// Keep the master key out of version control. Failure here is reported
/// but never fails the init - the store itself is already valid.
fn update_gitignore(directory: &Path, reporter: &dyn Reporter) {
    const COMMENT: &str = "# ZeroEnv - Master Key (DO NOT COMMIT)";
    let path = directory.join(".gitignore");

    let result = (|| -> std::io::Result<bool> {
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.lines().any(|line| line.trim() == KEY_FILE) {
                return Ok(false);
            }
            let mut updated = content;
            if !updated.is_empty() && !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push_str(&format!("\n{COMMENT}\n{KEY_FILE}\n"));
            std::fs::write(&path, updated)?;
        } else {
            std::fs::write(&path, format!("{COMMENT}\n{KEY_FILE}\n"))?;
        }
        Ok(true)
    })();

    match result {
        Ok(true) => reporter.success(&format!("Added '{KEY_FILE}' to .gitignore")),
        Ok(false) => reporter.info(&format!("'{KEY_FILE}' already in .gitignore")),
        Err(e) => {
            reporter.error(&format!("Failed to update .gitignore: {e}"));
            reporter.info(&format!("Please manually add {KEY_FILE} to .gitignore"));
        }
    }
}

fn cmd_add(
    directory: &Path,
    name: Option<String>,
    value: Option<String>,
    reporter: &dyn Reporter,
) -> Result<u8> {
    let store = SecretStore::open(directory)?;

    let name = match name {
        Some(name) => name,
        None => prompt_line("Secret name: ")?,
    };
    let value = match value {
        Some(value) => value,
        None => rpassword::prompt_password(format!("Value for {name}: "))?,
    };

    store.add(&name, &value)?;
    reporter.success(&format!("Added secret: {name}"));
    Ok(0)
}

fn cmd_get(directory: &Path, name: &str, no_show: bool, reporter: &dyn Reporter) -> Result<u8> {
    let store = SecretStore::open(directory)?;
    match store.get(name)? {
        Some(value) => {
            if no_show {
                reporter.info(&format!("Secret {name} exists"));
            } else {
                println!("{value}");
            }
            Ok(0)
        }
        None => {
            reporter.error(&format!("Secret not found: {name}"));
            Ok(1)
        }
    }
}

fn cmd_ls(directory: &Path, values: bool, reporter: &dyn Reporter) -> Result<u8> {
    let store = SecretStore::open(directory)?;

    if values {
        let secrets = store.get_all()?;
        if secrets.is_empty() {
            reporter.info("No secrets found. Add some with 'zeroenv add'");
            return Ok(0);
        }
        for (name, value) in secrets {
            println!("{name} = {value}");
        }
    } else {
        let names = store.list()?;
        if names.is_empty() {
            reporter.info("No secrets found. Add some with 'zeroenv add'");
            return Ok(0);
        }
        for name in names {
            println!("{name}");
        }
    }
    Ok(0)
}

fn cmd_rm(directory: &Path, name: &str, yes: bool, reporter: &dyn Reporter) -> Result<u8> {
    let store = SecretStore::open(directory)?;

    if !yes && !confirm(&format!("Remove secret '{name}'? [y/N] "))? {
        reporter.info("Cancelled");
        return Ok(0);
    }

    if store.remove(name)? {
        reporter.success(&format!("Removed secret: {name}"));
        Ok(0)
    } else {
        reporter.error(&format!("Secret not found: {name}"));
        Ok(1)
    }
}

fn cmd_run(directory: &Path, command: &[String], reporter: &dyn Reporter) -> Result<u8> {
    let store = SecretStore::open(directory)?;
    let secrets = store.get_all()?;
    reporter.success(&format!("Injected {} secret(s)", secrets.len()));

    let (program, args) = command
        .split_first()
        .ok_or_else(|| ZeroEnvError::InvalidConfiguration("empty command".into()))?;

    let status = std::process::Command::new(program)
        .args(args)
        .envs(secrets)
        .status()?;

    // Propagate the child's exit code; 130 when killed by a signal
    // (matches shell convention for interrupt).
    Ok(status.code().map(|c| c as u8).unwrap_or(130))
}

fn cmd_export(directory: &Path, format: ExportFormat) -> Result<u8> {
    let store = SecretStore::open(directory)?;
    let secrets = store.get_all()?;

    match format {
        ExportFormat::Env => {
            for (name, value) in &secrets {
                println!("{}", format_env_line(name, value));
            }
        }
        ExportFormat::Json => {
            let json = serde_json::to_string_pretty(&secrets)
                .map_err(|e| ZeroEnvError::Serialization(e.to_string()))?;
            println!("{json}");
        }
    }
    Ok(0)
}

/// Format one `NAME=VALUE` export line, quoting values that contain
/// spaces or quote characters.
fn format_env_line(name: &str, value: &str) -> String {
    if value.contains(' ') || value.contains('"') || value.contains('\'') {
        format!("{name}=\"{}\"", value.replace('"', "\\\""))
    } else {
        format!("{name}={value}")
    }
}

fn cmd_info(directory: &Path, reporter: &dyn Reporter) -> Result<u8> {
    let store = SecretStore::open(directory)?;
    let tier = store.security_tier()?;
    let count = store.secret_count()?;

    reporter.info(&format!("Directory: {}", store.directory().display()));
    reporter.info(&format!(
        "Security tier: {tier} ({} PBKDF2 iterations)",
        tier.iterations()
    ));
    reporter.info(&format!("Secrets: {count}"));
    Ok(0)
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn confirm(prompt: &str) -> Result<bool> {
    let answer = prompt_line(prompt)?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_env_line_plain() {
        assert_eq!(format_env_line("API_KEY", "12345"), "API_KEY=12345");
    }

    #[test]
    fn test_format_env_line_quotes_spaces() {
        assert_eq!(
            format_env_line("MSG", "hello world"),
            "MSG=\"hello world\""
        );
    }

    #[test]
    fn test_format_env_line_escapes_double_quotes() {
        assert_eq!(
            format_env_line("Q", "say \"hi\""),
            "Q=\"say \\\"hi\\\"\""
        );
    }

    #[test]
    fn test_format_env_line_single_quote_triggers_quoting() {
        assert_eq!(format_env_line("Q", "it's"), "Q=\"it's\"");
    }
}
