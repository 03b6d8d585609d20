use std::env;
use std::fs;
use std::path::Path;
use std::process;

use psalter::view_state::{self, ViewState};
use psalter::{declared_voices, filter_voices, Voice, VoiceSelection};
use psalter_cli::{build_page, CliError, FsFetcher, LibraryFetcher, SiteConfig, ViewOverrides};
use url::Url;

const USAGE: &str = "Usage: psalter filter <tune.abc> [--voices SATB]
       psalter voices <tune.abc>
       psalter url <address> [--transpose N] [--up] [--down] [--voices SATB] [--toggle S|A|T|B]
       psalter build [<dir>] [--config psalter.yaml] [--demo] [--transpose N] [--voices SATB] [-o out.html]";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), CliError> {
    let (command, rest) = args
        .split_first()
        .ok_or_else(|| CliError::Usage(USAGE.to_string()))?;

    match command.as_str() {
        "filter" => filter(rest),
        "voices" => voices(rest),
        "url" => rewrite_url(rest),
        "build" => build(rest),
        "-h" | "--help" => {
            println!("{}", USAGE);
            Ok(())
        }
        _ => Err(CliError::Usage(USAGE.to_string())),
    }
}

/// Split arguments into positionals and `--flag value` / `--switch` options.
struct Args<'a> {
    positional: Vec<&'a str>,
    options: Vec<(&'a str, Option<&'a str>)>,
}

const SWITCHES: [&str; 3] = ["--up", "--down", "--demo"];

impl<'a> Args<'a> {
    fn parse(args: &'a [String]) -> Result<Self, CliError> {
        let mut positional = Vec::new();
        let mut options = Vec::new();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            if SWITCHES.contains(&arg.as_str()) {
                options.push((arg.as_str(), None));
            } else if arg.starts_with('-') && arg.len() > 1 && arg.parse::<i32>().is_err() {
                let value = iter
                    .next()
                    .ok_or_else(|| CliError::Usage(format!("{} needs a value", arg)))?;
                options.push((arg.as_str(), Some(value.as_str())));
            } else {
                positional.push(arg.as_str());
            }
        }

        Ok(Args {
            positional,
            options,
        })
    }

    fn value(&self, name: &str) -> Option<&'a str> {
        self.options
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| *v)
    }

    fn has(&self, name: &str) -> bool {
        self.options.iter().any(|(n, _)| *n == name)
    }

    fn transpose(&self) -> Result<Option<i32>, CliError> {
        self.value("--transpose")
            .map(|v| {
                v.parse()
                    .map_err(|_| CliError::Usage(format!("--transpose expects an integer, got '{}'", v)))
            })
            .transpose()
    }
}

fn read_file(path: &str) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })
}

fn filter(args: &[String]) -> Result<(), CliError> {
    let args = Args::parse(args)?;
    let path = args
        .positional
        .first()
        .ok_or_else(|| CliError::Usage("psalter filter <tune.abc> [--voices SATB]".to_string()))?;
    let selection = args
        .value("--voices")
        .map(VoiceSelection::parse)
        .unwrap_or_default();

    print!("{}", filter_voices(&read_file(path)?, &selection));
    Ok(())
}

fn voices(args: &[String]) -> Result<(), CliError> {
    let args = Args::parse(args)?;
    let path = args
        .positional
        .first()
        .ok_or_else(|| CliError::Usage("psalter voices <tune.abc>".to_string()))?;

    match declared_voices(&read_file(path)?) {
        Some(voices) => {
            for voice in voices.voices() {
                println!("{} {}", voice.as_char(), voice.name());
            }
        }
        None => eprintln!("{} declares no S/A/T/B voices", path),
    }
    Ok(())
}

fn rewrite_url(args: &[String]) -> Result<(), CliError> {
    let args = Args::parse(args)?;
    let address = args
        .positional
        .first()
        .ok_or_else(|| CliError::Usage("psalter url <address> [options]".to_string()))?;
    let mut url = Url::parse(address).map_err(psalter::PsalterError::from)?;

    let mut state = ViewState::from_url(&url);
    if let Some(transpose) = args.transpose()? {
        state.transpose = transpose;
    }
    if args.has("--up") {
        state.transpose_up();
    }
    if args.has("--down") {
        state.transpose_down();
    }
    if let Some(voices) = args.value("--voices") {
        state.voices = VoiceSelection::parse(voices);
    }
    if let Some(toggle) = args.value("--toggle") {
        for voice in toggle.chars().flat_map(char::to_uppercase).filter_map(Voice::from_char) {
            state.toggle_voice(voice);
        }
    }
    state.write_to(&mut url);

    println!("{}", url);
    eprintln!(
        "transpose {}, voices {}",
        view_state::format_transpose(state.transpose),
        state.voices
    );
    Ok(())
}

fn build(args: &[String]) -> Result<(), CliError> {
    let args = Args::parse(args)?;
    let dir = Path::new(args.positional.first().copied().unwrap_or("."));
    let config_path = args
        .value("--config")
        .map(|p| dir.join(p))
        .unwrap_or_else(|| dir.join("psalter.yaml"));
    let config = SiteConfig::load(&config_path)?;

    let overrides = ViewOverrides {
        transpose: args.transpose()?,
        voices: args.value("--voices").map(VoiceSelection::parse),
    };

    let html = if args.has("--demo") {
        build_page(&config, &LibraryFetcher, &overrides)?
    } else {
        build_page(&config, &FsFetcher::new(dir), &overrides)?
    };

    match args.value("-o") {
        Some(path) => {
            fs::write(path, &html).map_err(|source| CliError::Io {
                path: path.to_string(),
                source,
            })?;
            eprintln!("Wrote page to {}", path);
        }
        None => println!("{}", html),
    }
    Ok(())
}
