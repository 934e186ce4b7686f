use crate::error::PosixError;
use crate::ops;
use crate::test_support::{expect, expect_with, with_mock};

#[test]
fn getattr_of_writable_file_of_size_seven() {
    with_mock(
        vec![
            expect("entity_type", "/f", "1"),
            expect("file_writable", "/f", "1"),
            expect("file_size", "/f", "7"),
        ],
        |client| {
            let meta = ops::getattr(client, "/f").unwrap();
            assert!(meta.writable);
            assert_eq!(meta.size, 7);
        },
    );
}

#[test]
fn getattr_of_absent_path_is_not_found() {
    with_mock(vec![expect("entity_type", "/gone", "0")], |client| {
        let err = ops::getattr(client, "/gone").unwrap_err();
        assert_eq!(err, PosixError::NotFound);
    });
}

#[test]
fn getattr_of_socket_has_fixed_shape() {
    with_mock(vec![expect("entity_type", "/s", "2")], |client| {
        let meta = ops::getattr(client, "/s").unwrap();
        assert!(!meta.writable);
        assert_eq!(meta.size, 0);
    });
}

#[test]
fn getattr_of_directory_has_fixed_shape() {
    with_mock(vec![expect("entity_type", "/d", "3")], |client| {
        let meta = ops::getattr(client, "/d").unwrap();
        assert_eq!(meta.size, 0);
    });
}

#[test]
fn readdir_emits_dot_dotdot_then_backend_names_in_order() {
    with_mock(
        vec![
            expect("exists", "/d", "1"),
            expect("read_dir", "/d", "a\nb"),
        ],
        |client| {
            let names = ops::readdir(client, "/d").unwrap();
            assert_eq!(names, vec![".", "..", "a", "b"]);
        },
    );
}

#[test]
fn readdir_of_empty_directory_yields_only_dot_entries() {
    with_mock(
        vec![expect("exists", "/empty", "1"), expect("read_dir", "/empty", "")],
        |client| {
            let names = ops::readdir(client, "/empty").unwrap();
            assert_eq!(names, vec![".", ".."]);
        },
    );
}

#[test]
fn readdir_of_absent_path_is_not_found() {
    with_mock(vec![expect("exists", "/gone", "0")], |client| {
        let err = ops::readdir(client, "/gone").unwrap_err();
        assert_eq!(err, PosixError::NotFound);
    });
}

#[test]
fn open_for_write_on_read_only_file_is_denied() {
    with_mock(
        vec![expect("exists", "/ro", "1"), expect("file_writable", "/ro", "0")],
        |client| {
            let err = ops::open(client, "/ro", true).unwrap_err();
            assert_eq!(err, PosixError::PermissionDenied);
        },
    );
}

#[test]
fn open_read_only_on_read_only_file_succeeds() {
    with_mock(vec![expect("exists", "/ro", "1")], |client| {
        ops::open(client, "/ro", false).unwrap();
    });
}

#[test]
fn write_sends_offset_and_payload_verbatim_and_returns_full_size() {
    with_mock(
        vec![
            expect("exists", "/f", "1"),
            expect_with(|req| {
                assert_eq!(req.verb, "write_file");
                assert_eq!(req.path, "/f");
                assert_eq!(req.x, 10);
                assert_eq!(req.y, 0);
                assert_eq!(req.data, vec![0x00, 0x01, 0x02, 0x03]);
                b"1".to_vec()
            }),
        ],
        |client| {
            let n = ops::write(client, "/f", 10, &[0x00, 0x01, 0x02, 0x03]).unwrap();
            assert_eq!(n, 4);
        },
    );
}

#[test]
fn read_returns_short_reply_as_is() {
    with_mock(
        vec![
            expect("exists", "/f", "1"),
            expect_with(|req| {
                assert_eq!(req.verb, "read_file");
                assert_eq!(req.x, 0);
                assert_eq!(req.y, 16);
                vec![0u8; 10]
            }),
        ],
        |client| {
            let data = ops::read(client, "/f", 0, 16).unwrap();
            assert_eq!(data.len(), 10);
        },
    );
}

#[test]
fn rename_no_replace_against_existing_destination_is_already_exists_without_rename_verb() {
    with_mock(
        vec![expect("exists", "/a", "1"), expect("exists", "/b", "1")],
        |client| {
            let err = ops::rename(client, "/a", "/b", true, false).unwrap_err();
            assert_eq!(err, PosixError::AlreadyExists);
        },
    );
}

#[test]
fn rename_exchange_against_absent_destination_is_not_found_without_exchange_verb() {
    with_mock(
        vec![expect("exists", "/a", "1"), expect("exists", "/b", "0")],
        |client| {
            let err = ops::rename(client, "/a", "/b", false, true).unwrap_err();
            assert_eq!(err, PosixError::NotFound);
        },
    );
}

#[test]
fn rename_plain_issues_rename_verb_with_destination_as_data() {
    with_mock(
        vec![
            expect("exists", "/a", "1"),
            expect_with(|req| {
                assert_eq!(req.verb, "rename");
                assert_eq!(req.path, "/a");
                assert_eq!(req.data, b"/b");
                b"1".to_vec()
            }),
        ],
        |client| {
            ops::rename(client, "/a", "/b", false, false).unwrap();
        },
    );
}

#[test]
fn truncate_on_non_writable_file_is_permission_denied() {
    with_mock(
        vec![expect("exists", "/f", "1"), expect("file_writable", "/f", "0")],
        |client| {
            let err = ops::truncate(client, "/f", 0).unwrap_err();
            assert_eq!(err, PosixError::PermissionDenied);
        },
    );
}

#[test]
fn mkdir_has_no_existence_precheck() {
    with_mock(vec![expect("mkdir", "/new", "1")], |client| {
        ops::mkdir(client, "/new").unwrap();
    });
}

#[test]
fn create_has_no_existence_precheck() {
    with_mock(vec![expect("create_file", "/new", "1")], |client| {
        ops::create(client, "/new").unwrap();
    });
}

#[test]
fn unlink_of_absent_path_is_not_found_without_unlink_verb() {
    with_mock(vec![expect("exists", "/gone", "0")], |client| {
        let err = ops::unlink(client, "/gone").unwrap_err();
        assert_eq!(err, PosixError::NotFound);
    });
}

#[test]
fn chmod_always_succeeds_once_the_path_exists() {
    with_mock(vec![expect("exists", "/f", "1")], |client| {
        ops::chmod(client, "/f").unwrap();
    });
}

#[test]
fn chmod_of_absent_path_is_not_found() {
    with_mock(vec![expect("exists", "/gone", "0")], |client| {
        let err = ops::chmod(client, "/gone").unwrap_err();
        assert_eq!(err, PosixError::NotFound);
    });
}
