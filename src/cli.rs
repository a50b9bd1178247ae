//! Command-line parsing: `generate [--out PATH] [--seed N] [--per-type N]` or `serve`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
  #[error("{flag} requires a value")]
  MissingValue { flag: &'static str },
  #[error("unknown argument: {0}")]
  UnknownArg(String),
  #[error("unknown command: {0} (expected `generate` or `serve`)")]
  UnknownCommand(String),
  #[error("invalid {flag} value: {raw}")]
  InvalidNumber { flag: &'static str, raw: String },
}

/// Flags that override the `[generator]` config section for one run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GenerateArgs {
  pub out: Option<PathBuf>,
  pub seed: Option<u64>,
  pub per_type: Option<usize>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
  Generate(GenerateArgs),
  Serve,
}

fn require_value(args: &mut impl Iterator<Item = String>, flag: &'static str) -> Result<String, ArgsError> {
  args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
  raw.parse().map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

impl Command {
  /// Parse arguments after the program name. No command means `serve`.
  pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
    let mut args = args.into_iter();
    match args.next().as_deref() {
      None | Some("serve") => match args.next() {
        None => Ok(Command::Serve),
        Some(other) => Err(ArgsError::UnknownArg(other)),
      },
      Some("generate") => {
        let mut out = GenerateArgs::default();
        while let Some(arg) = args.next() {
          match arg.as_str() {
            "--out" => out.out = Some(PathBuf::from(require_value(&mut args, "--out")?)),
            "--seed" => out.seed = Some(parse_number(require_value(&mut args, "--seed")?, "--seed")?),
            "--per-type" => {
              out.per_type = Some(parse_number(require_value(&mut args, "--per-type")?, "--per-type")?)
            }
            _ => return Err(ArgsError::UnknownArg(arg)),
          }
        }
        Ok(Command::Generate(out))
      }
      Some(other) => Err(ArgsError::UnknownCommand(other.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Result<Command, ArgsError> {
    Command::parse(args.iter().map(|s| s.to_string()))
  }

  #[test]
  fn defaults_to_serve() {
    assert_eq!(parse(&[]), Ok(Command::Serve));
    assert_eq!(parse(&["serve"]), Ok(Command::Serve));
  }

  #[test]
  fn generate_flags() {
    let cmd = parse(&["generate", "--seed", "7", "--out", "bank.json", "--per-type", "3"]).unwrap();
    assert_eq!(
      cmd,
      Command::Generate(GenerateArgs { out: Some("bank.json".into()), seed: Some(7), per_type: Some(3) })
    );
  }

  #[test]
  fn bad_input_is_reported() {
    assert_eq!(parse(&["generate", "--seed"]), Err(ArgsError::MissingValue { flag: "--seed" }));
    assert_eq!(
      parse(&["generate", "--per-type", "many"]),
      Err(ArgsError::InvalidNumber { flag: "--per-type", raw: "many".into() })
    );
    assert_eq!(parse(&["play"]), Err(ArgsError::UnknownCommand("play".into())));
    assert_eq!(parse(&["serve", "--x"]), Err(ArgsError::UnknownArg("--x".into())));
  }
}
