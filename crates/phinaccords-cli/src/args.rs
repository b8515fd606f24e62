//! Command-line parsing

use std::path::PathBuf;

use phinaccords_core::SongId;

pub const USAGE: &str = "\
Usage: phinaccords [--catalog <songs.json>] <command>

Commands:
  list [--tag <tag>]                 List songs in the library
  show <song-id> [--transpose <n>]   Print a song's chord chart
  practice <song-id> [--transpose <n>] [--bpm <bpm>] [--loop] [--seconds <s>]
                                     Play a chart in real time";

#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    pub catalog: Option<PathBuf>,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List { tag: Option<String> },
    Show { song: SongId, transpose: i32 },
    Practice(PracticeArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeArgs {
    pub song: SongId,
    pub transpose: i32,
    pub bpm: Option<f64>,
    pub looping: bool,
    /// Stop after this many seconds even if the chart has not finished
    pub seconds: Option<f64>,
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Cli, String> {
    let mut args = args.into_iter();
    let mut catalog = None;
    let mut positional = Vec::new();
    let mut tag = None;
    let mut transpose = 0;
    let mut bpm = None;
    let mut looping = false;
    let mut seconds = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                return Ok(Cli {
                    catalog,
                    command: Command::Help,
                });
            }
            "--catalog" => catalog = Some(PathBuf::from(value_for(&mut args, "--catalog")?)),
            "--tag" => tag = Some(value_for(&mut args, "--tag")?),
            "--transpose" => transpose = number_for(&mut args, "--transpose")?,
            "--bpm" => bpm = Some(number_for(&mut args, "--bpm")?),
            "--seconds" => seconds = Some(number_for(&mut args, "--seconds")?),
            "--loop" => looping = true,
            flag if flag.starts_with("--") => return Err(format!("Unknown option: {flag}")),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None | Some("help") => Command::Help,
        Some("list") => Command::List { tag },
        Some("show") => Command::Show {
            song: song_arg(positional.next())?,
            transpose,
        },
        Some("practice") => Command::Practice(PracticeArgs {
            song: song_arg(positional.next())?,
            transpose,
            bpm,
            looping,
            seconds,
        }),
        Some(other) => return Err(format!("Unknown command: {other}")),
    };

    if let Some(extra) = positional.next() {
        return Err(format!("Unexpected argument: {extra}"));
    }

    Ok(Cli { catalog, command })
}

fn value_for(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("{flag} needs a value"))
}

fn number_for<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<T, String> {
    let value = value_for(args, flag)?;
    value
        .parse()
        .map_err(|_| format!("{flag} expects a number, got {value:?}"))
}

fn song_arg(arg: Option<String>) -> Result<SongId, String> {
    arg.map(SongId::from).ok_or_else(|| "Missing song id".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Cli, String> {
        parse_args(line.split_whitespace().map(String::from))
    }

    #[test]
    fn test_practice_command() {
        let cli = parse("practice way-maker --transpose -2 --bpm 72.5 --loop").unwrap();
        assert_eq!(
            cli.command,
            Command::Practice(PracticeArgs {
                song: SongId::new("way-maker"),
                transpose: -2,
                bpm: Some(72.5),
                looping: true,
                seconds: None,
            })
        );
        assert_eq!(cli.catalog, None);
    }

    #[test]
    fn test_list_and_show() {
        let cli = parse("--catalog songs.json list --tag Live").unwrap();
        assert_eq!(cli.catalog, Some(PathBuf::from("songs.json")));
        assert_eq!(cli.command, Command::List { tag: Some("Live".into()) });

        let cli = parse("show awesome-god --transpose 3").unwrap();
        assert_eq!(
            cli.command,
            Command::Show {
                song: SongId::new("awesome-god"),
                transpose: 3
            }
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse("practice").unwrap_err().contains("Missing song id"));
        assert!(parse("show x --transpose up").unwrap_err().contains("--transpose"));
        assert!(parse("list --bogus").unwrap_err().contains("--bogus"));
        assert!(parse("dance").unwrap_err().contains("dance"));
        assert!(parse("show a b").unwrap_err().contains("Unexpected"));
        assert_eq!(parse("").unwrap().command, Command::Help);
    }
}
