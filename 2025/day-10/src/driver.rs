//! Input selection and the per-machine aggregation loop shared by both parts.

use std::path::{Path, PathBuf};

use miette::*;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::{Machine, Unsolvable};

/// Logs to stderr, level from `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Which puzzle file to read, resolved from the two positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSelection {
    pub folder: PathBuf,
    pub file: &'static str,
}

impl InputSelection {
    /// `i` as the first argument selects `input.txt`, anything else the
    /// bundled `example.txt`. The second argument is the folder.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let file = match args.next().as_deref() {
            Some("i") => "input.txt",
            _ => "example.txt",
        };
        let folder = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        Self { folder, file }
    }

    pub fn path(&self) -> PathBuf {
        self.folder.join(self.file)
    }

    pub fn read(&self) -> Result<String> {
        read_input(&self.path())
    }
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read puzzle input {}", path.display()))
}

/// Solves every machine in `input` and sums the minimum presses.
///
/// Blank lines are skipped. Machines that cannot be solved are reported and
/// contribute nothing; only invalid button indices abort the run.
pub fn total_presses<F>(input: &str, solve: F) -> Result<u64>
where
    F: Fn(&Machine) -> std::result::Result<u64, Unsolvable> + Sync,
{
    let machines = input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            Machine::parse(line.trim())
                .wrap_err_with(|| format!("invalid machine on line {}", idx + 1))
                .map(|machine| (idx + 1, machine))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(machines = machines.len(), "parsed machines");

    // Rayon workers do not inherit a scoped subscriber
    let dispatch = tracing::dispatcher::get_default(|current| current.clone());

    let total: u64 = machines
        .par_iter()
        .map(|(line, machine)| {
            tracing::dispatcher::with_default(&dispatch, || match solve(machine) {
                Ok(presses) => {
                    tracing::debug!(line, presses, "solved machine");
                    presses
                }
                Err(reason) => {
                    tracing::warn!(line, %reason, "machine contributes no presses");
                    0
                }
            })
        })
        .sum();

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use rstest::rstest;

    use crate::part2;

    /// Shared buffer the fmt subscriber writes into.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    /// Runs `f` with logs captured, returning its result and the log text.
    fn with_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, buffer.contents())
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(&[], "./example.txt")]
    #[case(&["i"], "./input.txt")]
    #[case(&["e"], "./example.txt")]
    #[case(&["i", "2025/day-10"], "2025/day-10/input.txt")]
    #[case(&["x", "data"], "data/example.txt")]
    fn selects_input_file(#[case] list: &[&str], #[case] expected: &str) {
        let selection = InputSelection::from_args(args(list));
        assert_eq!(selection.path(), PathBuf::from(expected));
    }

    #[test]
    fn missing_file_is_an_error() {
        let selection = InputSelection::from_args(args(&["i", "/definitely/not/here"]));
        let err = selection.read().unwrap_err();
        assert!(err.to_string().contains("failed to read puzzle input"));
    }

    #[test]
    fn blank_lines_are_skipped() -> Result<()> {
        let input = "\n[#] (0)\n\n   \n[#] (0)\n";
        assert_eq!(total_presses(input, |m| Ok(m.buttons.len() as u64))?, 2);
        Ok(())
    }

    #[test]
    fn unsolvable_machines_contribute_nothing() -> Result<()> {
        let input = "[#] (0)\n[.] (0)\n";
        let total = total_presses(input, |m| {
            if m.lights[0] {
                Ok(5)
            } else {
                Err(Unsolvable::Inconsistent)
            }
        })?;
        assert_eq!(total, 5);
        Ok(())
    }

    #[test]
    fn inconsistent_machine_is_logged() -> Result<()> {
        let (total, logs) = with_logs(|| part2::process("{3,3} (0)"));
        assert_eq!("0", total?);
        assert!(logs.contains("machine contributes no presses"));
        assert!(logs.contains("inconsistent system"));
        Ok(())
    }

    #[test]
    fn solved_machines_are_logged_at_debug() -> Result<()> {
        let (total, logs) = with_logs(|| part2::process("{5} (0)\n{3,3} (0)"));
        assert_eq!("5", total?);
        assert!(logs.contains("parsed machines"));
        assert!(logs.contains("solved machine"));
        assert!(logs.contains("presses=5"));
        Ok(())
    }

    #[test]
    fn invalid_index_aborts() {
        let err = total_presses("[#] (0)\n[#] (3)\n", |_| Ok(1)).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
