//! fixedledger-run - Apply a scenario of assets and lifecycle commands.

fn main() -> std::process::ExitCode {
    fixedledger::cmd::scenario::main()
}
