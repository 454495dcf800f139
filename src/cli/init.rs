//! Interactive config wizard
//!
//! Walks through base source path, environments, and builds on stdin,
//! pre-seeding answers from an existing config when one is found, and
//! writes the result to `martelo.config.json`.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::config::{
    load_config, BuildConfig, BuildSpec, BuilderType, EnvironmentConfig, SourceList,
};
use crate::log;

/// File the wizard writes.
const OUTPUT_FILENAME: &str = "martelo.config.json";

const BUILDER_CHOICES: [(&str, BuilderType); 4] = [
    ("copy", BuilderType::Copy),
    ("images", BuilderType::Images),
    ("scripts", BuilderType::Scripts),
    ("styles", BuilderType::Styles),
];

/// Run the init command against stdin/stdout.
pub fn run_init() -> ExitCode {
    let existing = load_config(None).ok();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let config = match run_wizard(&mut input, &mut output, existing) {
        Ok(config) => config,
        Err(e) => {
            log::error(&format!("Init aborted: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut json = match serde_json::to_string_pretty(&config) {
        Ok(json) => json,
        Err(e) => {
            log::error(&format!("Couldn't serialize config: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };
    json.push('\n');

    if let Err(e) = fs::write(OUTPUT_FILENAME, json) {
        log::error(&format!("Couldn't write {}: {}", OUTPUT_FILENAME, e));
        return ExitCode::from(EXIT_ERROR);
    }

    log::info(&format!("Config written to {}", OUTPUT_FILENAME));
    ExitCode::from(EXIT_SUCCESS)
}

/// Drive the whole wizard and assemble a config.
fn run_wizard(
    input: &mut impl BufRead,
    output: &mut impl Write,
    existing: Option<BuildConfig>,
) -> io::Result<BuildConfig> {
    let existing = existing.unwrap_or_default();

    let base_source_path = prompt(
        input,
        output,
        "Base source path",
        Some(&existing.base_source_path.to_string_lossy()),
    )?;

    writeln!(output, "Environments")?;
    let environments = inquire_environments(input, output, &existing.environments)?;

    writeln!(output, "Builds")?;
    let builds = inquire_builds(input, output, &existing.builds)?;

    Ok(BuildConfig {
        base_source_path: PathBuf::from(base_source_path),
        environments,
        builds,
        ..Default::default()
    })
}

fn inquire_environments(
    input: &mut impl BufRead,
    output: &mut impl Write,
    existing: &BTreeMap<String, EnvironmentConfig>,
) -> io::Result<BTreeMap<String, EnvironmentConfig>> {
    let existing_keys: Vec<&String> = existing.keys().collect();
    let mut environments = BTreeMap::new();
    let mut index = 0;

    loop {
        writeln!(output, "Environment #{}", index + 1)?;

        let current_key = existing_keys.get(index).map(|k| k.as_str());
        let current = current_key.and_then(|k| existing.get(k));

        let key = prompt(input, output, "Key", current_key)?;
        if key.is_empty() {
            break;
        }

        let path = prompt(
            input,
            output,
            "Path",
            current.map(|c| c.path.to_string_lossy()).as_deref(),
        )?;

        environments.insert(key, EnvironmentConfig { path: PathBuf::from(path), ignore: false });

        // Default to adding more while seeded environments remain
        let more_seeded = existing_keys.get(index + 1).is_some();
        let keep_adding = prompt_yes_no(
            input,
            output,
            "Add another environment?",
            existing.is_empty() || more_seeded,
        )?;
        index += 1;

        if !keep_adding {
            break;
        }
    }

    Ok(environments)
}

fn inquire_builds(
    input: &mut impl BufRead,
    output: &mut impl Write,
    existing: &BTreeMap<String, BuildSpec>,
) -> io::Result<BTreeMap<String, BuildSpec>> {
    let existing_keys: Vec<&String> = existing.keys().collect();
    let mut builds = BTreeMap::new();
    let mut index = 0;

    loop {
        writeln!(output, "Build #{}", index + 1)?;

        let current_key = existing_keys.get(index).map(|k| k.as_str());
        let current = current_key.and_then(|k| existing.get(k));

        let key = prompt(input, output, "Key", current_key)?;
        if key.is_empty() {
            break;
        }

        let builder = prompt_builder_type(input, output, current.map(|c| c.builder))?;

        let sources = prompt_paths(
            input,
            output,
            "Source path (relative to base source path; leave blank to stop adding)",
        )?;

        let destination = prompt(
            input,
            output,
            "Destination path (relative to environment path)",
            current.map(|c| c.destination.as_str()),
        )?;

        let watch = if prompt_yes_no(
            input,
            output,
            &format!("Create a watch list for {}?", key),
            current.map(|c| !c.watch.is_empty()).unwrap_or(false),
        )? {
            prompt_paths(
                input,
                output,
                "Watch path (relative to base source path; leave blank to stop adding)",
            )?
        } else {
            Vec::new()
        };

        builds.insert(
            key,
            BuildSpec {
                builder,
                source: SourceList::Many(sources),
                destination,
                options: BTreeMap::new(),
                watch,
            },
        );

        let more_seeded = existing_keys.get(index + 1).is_some();
        let keep_adding = prompt_yes_no(
            input,
            output,
            "Add another build?",
            existing.is_empty() || more_seeded,
        )?;
        index += 1;

        if !keep_adding {
            break;
        }
    }

    Ok(builds)
}

/// Ask one question; an empty answer picks the default when present.
/// EOF behaves like accepting the default.
fn prompt(
    input: &mut impl BufRead,
    output: &mut impl Write,
    question: &str,
    default: Option<&str>,
) -> io::Result<String> {
    match default {
        Some(default) if !default.is_empty() => write!(output, "{} [{}]: ", question, default)?,
        _ => write!(output, "{}: ", question)?,
    }
    output.flush()?;

    let mut line = String::new();
    let read = input.read_line(&mut line)?;

    let answer = line.trim();
    if answer.is_empty() || read == 0 {
        return Ok(default.unwrap_or_default().to_string());
    }

    Ok(answer.to_string())
}

fn prompt_yes_no(
    input: &mut impl BufRead,
    output: &mut impl Write,
    question: &str,
    default_yes: bool,
) -> io::Result<bool> {
    let default = if default_yes { "yes" } else { "no" };
    let answer = prompt(input, output, question, Some(default))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

fn prompt_builder_type(
    input: &mut impl BufRead,
    output: &mut impl Write,
    default: Option<BuilderType>,
) -> io::Result<BuilderType> {
    let choices: Vec<&str> = BUILDER_CHOICES.iter().map(|(name, _)| *name).collect();
    let default_name = default.map(|d| d.to_string());

    loop {
        let answer = prompt(
            input,
            output,
            &format!("Type ({})", choices.join("/")),
            default_name.as_deref().or(Some("copy")),
        )?;

        if let Some((_, builder)) =
            BUILDER_CHOICES.iter().find(|(name, _)| *name == answer.to_lowercase())
        {
            return Ok(*builder);
        }

        writeln!(output, "Unknown type '{}'", answer)?;
    }
}

/// Collect paths until a blank answer.
fn prompt_paths(
    input: &mut impl BufRead,
    output: &mut impl Write,
    question: &str,
) -> io::Result<Vec<String>> {
    let mut paths = Vec::new();

    loop {
        let answer = prompt(input, output, question, None)?;
        if answer.is_empty() {
            break;
        }
        paths.push(answer);
    }

    Ok(paths)
}
