//! fixedledger-classes - List the asset-class table.

fn main() -> std::process::ExitCode {
    fixedledger::cmd::classes::main()
}
