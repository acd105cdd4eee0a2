//! fixedledger-schedule - Preview a depreciation schedule.

fn main() -> std::process::ExitCode {
    fixedledger::cmd::schedule::main()
}
