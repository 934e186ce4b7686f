//! Mock-backend test harness shared by the `ops` and `filesystem` test
//! suites.
//!
//! A [`MockBackend`] drives one end of a `UnixStream` pair, answering a
//! fixed sequence of expected requests. Each step is a closure that
//! receives the parsed request and returns the raw reply bytes; the closure
//! is free to assert on the verb, path, or parameters it was given, so a
//! test failure at the wrong step points at the exact mismatched call.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::thread::{self, JoinHandle};

use byteorder::{LittleEndian, ReadBytesExt};
use netfs_proto::RequestClient;

pub(crate) struct MockRequest {
    pub verb: String,
    pub path: String,
    pub x: i32,
    pub y: i32,
    pub data: Vec<u8>,
}

type Step = Box<dyn FnMut(MockRequest) -> Vec<u8> + Send>;

/// Build a connected `RequestClient` whose backend answers `steps` in
/// order, then join the backend thread to assert every scripted step
/// actually happened.
pub(crate) fn with_mock<F>(steps: Vec<Step>, body: F)
where
    F: FnOnce(&mut RequestClient<UnixStream, UnixStream>),
{
    let (client_sock, server_sock) = UnixStream::pair().expect("unix socketpair");
    let server_reader = server_sock.try_clone().expect("clone socket");
    let handle = spawn_backend(server_reader, server_sock, steps);

    let client_reader = client_sock.try_clone().expect("clone socket");
    let mut client = RequestClient::new(client_reader, client_sock);
    body(&mut client);

    handle.join().expect("mock backend thread panicked");
}

fn spawn_backend(
    mut reader: UnixStream,
    mut writer: UnixStream,
    mut steps: Vec<Step>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for mut step in steps.drain(..) {
            let request = read_request(&mut reader);
            let reply = step(request);
            let mut framed = Vec::with_capacity(4 + reply.len());
            framed.extend_from_slice(&(reply.len() as u32).to_le_bytes());
            framed.extend_from_slice(&reply);
            writer.write_all(&framed).expect("write mock reply");
            writer.flush().expect("flush mock reply");
        }
    })
}

fn read_request(reader: &mut impl Read) -> MockRequest {
    let _total_length = reader.read_u32::<LittleEndian>().expect("read total_length");

    let type_len = reader.read_u32::<LittleEndian>().expect("read type_len") as usize;
    let mut verb = vec![0u8; type_len];
    reader.read_exact(&mut verb).expect("read type");

    let path_len = reader.read_u32::<LittleEndian>().expect("read path_len") as usize;
    let mut path = vec![0u8; path_len];
    reader.read_exact(&mut path).expect("read path");

    let x = reader.read_i32::<LittleEndian>().expect("read x_param");
    let y = reader.read_i32::<LittleEndian>().expect("read y_param");

    let data_len = reader.read_u32::<LittleEndian>().expect("read data_len") as usize;
    let mut data = vec![0u8; data_len];
    reader.read_exact(&mut data).expect("read data");

    MockRequest {
        verb: String::from_utf8(verb).expect("verb is ascii"),
        path: String::from_utf8(path).expect("path is utf8"),
        x,
        y,
        data,
    }
}

/// Script a step that asserts the verb and path, ignoring `x`/`y`/`data`,
/// and replies with `reply`.
pub(crate) fn expect(verb: &'static str, path: &'static str, reply: &'static str) -> Step {
    Box::new(move |req: MockRequest| {
        assert_eq!(req.verb, verb, "unexpected verb");
        assert_eq!(req.path, path, "unexpected path");
        reply.as_bytes().to_vec()
    })
}

/// Script a step with full control over the assertion and reply bytes.
pub(crate) fn expect_with(f: impl FnMut(MockRequest) -> Vec<u8> + Send + 'static) -> Step {
    Box::new(f)
}
