use chainpulse::{core, signals};
use chainpulse::status::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};

/// Entry point - catches Ctrl+C and calls core::run()
///
/// Returns ExitStatus directly, which implements std::process::Termination.
fn main() -> ExitStatus {
    // A Ctrl+C while a backend call is pending abandons that call only;
    // otherwise it flags the interrupt so prompts can wind down cleanly
    ctrlc::set_handler(move || {
        if signals::cancel_active_request() {
            eprintln!("\nRequest cancelled");
            return;
        }

        signals::set_interrupted();
        eprintln!("\nInterrupted");

        // On second Ctrl+C, force exit (user really wants out)
        static SECOND_CTRL_C: AtomicBool = AtomicBool::new(false);
        if SECOND_CTRL_C.swap(true, Ordering::SeqCst) {
            std::process::exit(ExitStatus::Interrupted as i32);
        }
    })
    .ok();

    let args: Vec<String> = std::env::args().collect();
    let status = core::run(args);

    if signals::was_interrupted() {
        return ExitStatus::Interrupted;
    }

    status
}
