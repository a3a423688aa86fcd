use crate::env::EnvSource;
use crate::error::{MaterializeError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Tunables for a materialization run.
#[derive(Debug, Clone, Copy)]
pub struct MaterializeOptions {
    /// Check that the decoded payload parses as JSON. On by default; the
    /// output file is removed again when the check fails, so a garbage
    /// credential file never survives a failed run.
    pub validate_json: bool,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            validate_json: true,
        }
    }
}

/// Summary of a successful materialization.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Variable the credential material was read from.
    pub variable: String,
    /// Path the decoded bytes were written to.
    pub path: PathBuf,
    /// Number of decoded bytes on disk.
    pub bytes_written: usize,
}

/// One-shot secret materializer over an injected environment source.
#[derive(Debug, Clone)]
pub struct Materializer<S> {
    source: S,
    options: MaterializeOptions,
}

impl Materializer<crate::env::ProcessEnv> {
    /// Materializer reading the live process environment with defaults.
    pub fn from_process_env() -> Self {
        Self::new(crate::env::ProcessEnv)
    }
}

impl<S: EnvSource> Materializer<S> {
    /// Construct with default options.
    pub fn new(source: S) -> Self {
        Self::with_options(source, MaterializeOptions::default())
    }

    /// Construct with explicit options.
    pub fn with_options(source: S, options: MaterializeOptions) -> Self {
        Self { source, options }
    }

    /// Decodes the base64 value held in `variable` and writes it to `output`.
    ///
    /// Lookup and decode happen before anything touches the filesystem, so a
    /// missing variable or bad base64 leaves `output` exactly as it was. A
    /// payload that fails JSON validation is written and then removed again:
    /// after any call the file either does not exist or holds exactly the
    /// decoded bytes of the most recent successful run.
    pub fn materialize(&self, variable: &str, output: &Path) -> Result<Report> {
        if variable.is_empty() {
            return Err(MaterializeError::Usage);
        }

        // Secret-manager integrations routinely append a trailing newline to
        // the injected value; treat surrounding whitespace as insignificant.
        let value = match self.source.get(variable) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                return Err(MaterializeError::MissingVariable {
                    name: variable.to_string(),
                })
            }
        };

        let decoded = STANDARD
            .decode(value.trim())
            .map_err(|source| MaterializeError::Decode {
                name: variable.to_string(),
                source,
            })?;

        write_output(output, &decoded)?;

        if self.options.validate_json {
            if let Err(source) = serde_json::from_slice::<serde_json::Value>(&decoded) {
                tracing::debug!(
                    variable,
                    path = %output.display(),
                    error = %source,
                    "decoded payload failed JSON validation, removing output"
                );
                remove_output(output)?;
                return Err(MaterializeError::InvalidPayload { source });
            }
        }

        tracing::info!(
            variable,
            path = %output.display(),
            bytes = decoded.len(),
            "credential file materialized"
        );

        Ok(Report {
            variable: variable.to_string(),
            path: output.to_path_buf(),
            bytes_written: decoded.len(),
        })
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |source| MaterializeError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let mut file = fs::File::create(path).map_err(io_err)?;
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(io_err)
}

fn remove_output(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(MaterializeError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
