//! Completions command implementation

use crate::cli::{Cli, CompletionsArgs};
use clap::CommandFactory;
use clap_complete::generate;
use std::io;

/// Handle `dualroute completions` command
pub fn handle_completions(args: &CompletionsArgs) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, bin_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap_complete::Shell;

    #[test]
    fn test_completions_generate_into_buffer() {
        let mut cmd = Cli::command();
        let mut buf = Vec::new();
        generate(Shell::Bash, &mut cmd, "dualroute", &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("dualroute"));
        assert!(script.contains("route"));
    }

    #[test]
    fn test_command_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
