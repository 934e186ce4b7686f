//! Mounts a netfs backend as a FUSE filesystem.
//!
//! Spawns the backend named by `NETFS_BACKEND_CMD`, wires its stdio into a
//! [`netfs_proto::RequestClient`], and hands that client to
//! [`netfs_fs::NetfsFilesystem`] for the lifetime of the mount.

use std::env;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use clap::Parser;
use fuser::MountOption;
use log::{error, info};
use netfs_fs::NetfsFilesystem;
use netfs_proto::RequestClient;

#[derive(Parser)]
#[command(about = "Mount a netfs backend at a directory")]
struct Args {
    /// Absolute path of the mount point.
    mountpoint: String,
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    let backend_cmd = match env::var("NETFS_BACKEND_CMD") {
        Ok(cmd) => cmd,
        Err(_) => {
            error!("NETFS_BACKEND_CMD is not set; nothing to talk to");
            std::process::exit(1);
        },
    };
    let backend_args: Vec<String> = env::var("NETFS_BACKEND_ARGS")
        .map(|raw| raw.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default();

    let mut child = match Command::new(&backend_cmd)
        .args(&backend_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            error!("failed to spawn backend {backend_cmd}: {err}");
            std::process::exit(1);
        },
    };

    let stdin = child.stdin.take().expect("child stdin was piped");
    let stdout = child.stdout.take().expect("child stdout was piped");
    let client: RequestClient<ChildStdout, ChildStdin> = RequestClient::new(stdout, stdin);
    let filesystem = NetfsFilesystem::new(client);

    let options = vec![MountOption::FSName("netfs".to_owned())];

    info!("mounting {} backed by `{backend_cmd}`", args.mountpoint);
    let mount_result = fuser::mount2(filesystem, &args.mountpoint, &options);

    let backend_status = reap_backend(&mut child);
    match (&mount_result, backend_status) {
        (Err(err), _) => {
            error!("mount session ended with an error: {err}");
            std::process::exit(1);
        },
        (Ok(()), Some(status)) if !status.success() => {
            error!("backend process exited unexpectedly with {status}");
            std::process::exit(1);
        },
        _ => info!("unmounted cleanly"),
    }
}

/// Reap the backend child if it has already exited (it may still be
/// running after a clean unmount; that's not an error).
fn reap_backend(child: &mut Child) -> Option<std::process::ExitStatus> {
    child.try_wait().ok().flatten()
}
