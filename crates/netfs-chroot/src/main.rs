//! Runs a command inside a new root.
//!
//! `netfs-chroot <new-root> <working-dir-inside-new-root> <command> [args...]`
//!
//! Forks; the child changes into `new-root`, chroots to it, changes into
//! `working-dir`, then execs `command`. The parent waits and mirrors the
//! child's exit status.

use std::ffi::CString;
use std::process::ExitCode;

use log::error;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{chdir, chroot, execvp, fork, ForkResult};

fn usage(program_name: &str) {
    eprintln!("Usage: {program_name} <chroot_path> <working_dir> <command> [args...]");
}

fn main() -> ExitCode {
    env_logger::init();

    let argv: Vec<String> = std::env::args().collect();
    if argv.len() < 4 {
        usage(&argv[0]);
        return ExitCode::from(1);
    }

    let chroot_path = &argv[1];
    let working_dir = &argv[2];
    let command = &argv[3];
    let command_args = &argv[3..];

    // SAFETY: this process is single-threaded at the point of the fork, and
    // the child performs only async-signal-safe syscalls (chdir, chroot,
    // execvp) before either replacing its image or exiting.
    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            run_child(chroot_path, working_dir, command, command_args);
            // run_child only returns on failure.
            ExitCode::from(1)
        },
        Ok(ForkResult::Parent { child }) => run_parent(child),
        Err(err) => {
            error!("fork failed: {err}");
            ExitCode::from(1)
        },
    }
}

fn run_child(chroot_path: &str, working_dir: &str, command: &str, command_args: &[String]) {
    if let Err(err) = chdir(chroot_path) {
        error!("chdir to chroot path {chroot_path}: {err}");
        std::process::exit(1);
    }
    if let Err(err) = chroot(chroot_path) {
        error!("chroot to {chroot_path}: {err}");
        std::process::exit(1);
    }
    if let Err(err) = chdir(working_dir) {
        error!("chdir to working directory {working_dir}: {err}");
        std::process::exit(1);
    }

    let command_c = CString::new(command.as_bytes()).expect("command has no interior NUL");
    let args_c: Vec<CString> = command_args
        .iter()
        .map(|a| CString::new(a.as_bytes()).expect("argument has no interior NUL"))
        .collect();

    if let Err(err) = execvp(&command_c, &args_c) {
        error!("execvp {command}: {err}");
        std::process::exit(1);
    }
}

fn run_parent(child: nix::unistd::Pid) -> ExitCode {
    match waitpid(child, None) {
        Ok(WaitStatus::Exited(_, code)) => ExitCode::from(code as u8),
        Ok(WaitStatus::Signaled(_, signal, _)) => ExitCode::from((128 + signal as i32) as u8),
        Ok(_) => ExitCode::from(1),
        Err(err) => {
            error!("waitpid: {err}");
            ExitCode::from(1)
        },
    }
}
