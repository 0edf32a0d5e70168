// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line definition and the mapping from subcommands to channel calls.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use easyshare_bridge::MethodCall;
use easyshare_bridge::channel::{METHOD_GET_SDK_INT, METHOD_SAVE_TO_DOWNLOADS};
use easyshare_core::error::{EasyshareError, Result};
use serde_json::{Map, Value};

#[derive(Debug, Parser)]
#[command(name = "easyshare")]
#[command(about = "Copy files into the shared Downloads area through the easyshare/downloads channel")]
#[command(version)]
pub struct Cli {
    /// JSON config file (see BridgeConfig)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the platform SDK level
    SdkInt,
    /// Save a file into Downloads
    Save {
        /// File to copy
        path: PathBuf,
        /// Name shown in Downloads (defaults to the file's own name)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Send a raw method call
    Call {
        method: String,
        /// Arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,
    },
}

impl Command {
    /// Translate into the channel call it stands for.
    pub fn to_method_call(&self) -> Result<MethodCall> {
        match self {
            Self::SdkInt => Ok(MethodCall::new(METHOD_GET_SDK_INT)),
            Self::Save { path, name } => {
                let name = match name {
                    Some(name) => name.clone(),
                    None => path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .ok_or_else(|| {
                            EasyshareError::MissingArgument(format!(
                                "cannot derive a name from {}; pass --name",
                                path.display()
                            ))
                        })?,
                };
                Ok(MethodCall::new(METHOD_SAVE_TO_DOWNLOADS)
                    .with_arg("path", path.to_string_lossy().into_owned())
                    .with_arg("name", name))
            }
            Self::Call { method, args } => {
                let arguments = match args {
                    Some(raw) => serde_json::from_str::<Map<String, Value>>(raw)?,
                    None => Map::new(),
                };
                Ok(MethodCall {
                    method: method.clone(),
                    arguments,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn save_defaults_name_to_file_name() {
        let cli = Cli::parse_from(["easyshare", "save", "/tmp/cache/report.pdf"]);
        let call = cli.command.to_method_call().unwrap();

        assert_eq!(call.method, "saveToDownloads");
        assert_eq!(call.string_arg("path"), Some("/tmp/cache/report.pdf"));
        assert_eq!(call.string_arg("name"), Some("report.pdf"));
    }

    #[test]
    fn save_with_explicit_name_and_config() {
        let cli = Cli::parse_from([
            "easyshare",
            "save",
            "/tmp/cache/abc.tmp",
            "--name",
            "x.bin",
            "--config",
            "/etc/easyshare.json",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("/etc/easyshare.json")));
        let call = cli.command.to_method_call().unwrap();
        assert_eq!(call.string_arg("name"), Some("x.bin"));
    }

    #[test]
    fn raw_call_parses_arguments() {
        let cli = Cli::parse_from([
            "easyshare",
            "call",
            "saveToDownloads",
            "--args",
            r#"{"path":"/a","name":"b"}"#,
        ]);
        let call = cli.command.to_method_call().unwrap();
        assert_eq!(call.method, "saveToDownloads");
        assert_eq!(call.string_arg("path"), Some("/a"));
    }

    #[test]
    fn raw_call_rejects_bad_json() {
        let cli = Cli::parse_from(["easyshare", "call", "getSdkInt", "--args", "[1,2]"]);
        assert!(matches!(
            cli.command.to_method_call(),
            Err(EasyshareError::Serialization(_))
        ));
    }
}
