use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

extern "C" fn ignore_interrupt(_: nix::libc::c_int) {}

/// Keep the shell alive on `SIGINT` while letting children receive it.
///
/// A caught signal is reset to its default disposition across `exec`, so a
/// running child is still interrupted by the terminal, whereas `SIG_IGN`
/// would be inherited. Blocking reads and waits are restarted.
pub fn catch_interrupts() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(ignore_interrupt),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: the handler does nothing and so is async-signal-safe.
    unsafe { sigaction(Signal::SIGINT, &action) }?;
    Ok(())
}
