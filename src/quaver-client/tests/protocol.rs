mod common;

use common::{connect, connect_with, options, sent, Scripted};
use quaver_client::{
    AckCode, Command, ConnectOptions, Connection, ErrorKind, ListMode, MpdError, PlayState, Reply,
    SequenceError,
};
use std::time::Duration;

#[test]
fn handshake_records_version() {
    let (conn, log) = connect("");
    assert_eq!(conn.server_version(), (0, 23, 5));
    assert!(conn.is_idle());
    assert!(sent(&log).is_empty());
}

#[test]
fn foreign_greeting_is_not_server() {
    match Connection::from_stream(Scripted::new("SSH-2.0-OpenSSH_9.6\n"), options()) {
        Err(MpdError::NotServer { greeting }) => assert_eq!(greeting, "SSH-2.0-OpenSSH_9.6"),
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("handshake should fail"),
    }
}

#[test]
fn silent_server_is_no_response() {
    let stream = Scripted::new("").stalling();
    let options = ConnectOptions {
        timeout: Duration::from_millis(30),
        ..options()
    };
    assert!(matches!(
        Connection::from_stream(stream, options),
        Err(MpdError::NoResponse)
    ));
    assert!(matches!(
        Connection::from_stream(Scripted::new(""), options),
        Err(MpdError::NoResponse)
    ));
}

#[test]
fn status_reply_is_complete() {
    let (mut conn, log) = connect("volume: 50\nrepeat: 1\nstate: play\nsong: 3\ntime: 12:240\nOK\n");
    conn.send_status().unwrap();
    let status = conn.read_status().unwrap().expect("status record");

    assert_eq!(status.volume, 50);
    assert!(status.repeat);
    assert!(!status.random);
    assert_eq!(status.state, PlayState::Play);
    assert_eq!(status.song, 3);
    assert_eq!((status.elapsed_time, status.total_time), (12, 240));
    assert_eq!(status.playlist_length, -1);
    assert_eq!(status.crossfade, -1);

    assert_eq!(conn.read_status().unwrap(), None);
    assert!(conn.is_idle());
    assert_eq!(sent(&log), "status\n");
}

#[test]
fn ack_reports_code_and_message_and_keeps_connection() {
    let (mut conn, log) = connect("ACK [50@0] {play} song doesn't exist\nOK\n");
    conn.send_play(Some(99)).unwrap();

    let err = conn.next_element().unwrap_err();
    let ack = err.ack().expect("ack error");
    assert_eq!(ack.code, AckCode::NoExist);
    assert_eq!(ack.position, 0);
    assert_eq!(ack.command.as_deref(), Some("play"));

    let last = conn.last_error().expect("recorded");
    assert_eq!(last.kind, ErrorKind::Ack);
    assert_eq!(last.message, "song doesn't exist");

    assert!(conn.is_usable());
    assert!(conn.is_idle());
    assert!(matches!(
        conn.next_element(),
        Err(MpdError::Sequence(SequenceError::AlreadyDone))
    ));

    conn.ping().unwrap();
    assert!(conn.last_error().is_none());
    assert_eq!(sent(&log), "play \"99\"\nping\n");
}

#[test]
fn raw_drain_of_acknowledged_list() {
    let (mut conn, log) = connect("list_OK\nlist_OK\nOK\n");
    conn.list_ok_begin().unwrap();
    assert_eq!(conn.list_mode(), ListMode::Acknowledged);
    conn.send_add("a.mp3").unwrap();
    conn.send_add("b.mp3").unwrap();
    conn.list_end().unwrap();
    assert_eq!(conn.pending_list_oks(), 2);

    assert_eq!(conn.next_element().unwrap(), Reply::ListOk);
    assert_eq!(conn.pending_list_oks(), 1);
    assert_eq!(conn.next_element().unwrap(), Reply::ListOk);
    assert_eq!(conn.pending_list_oks(), 0);
    assert_eq!(conn.next_element().unwrap(), Reply::Ok);
    assert!(conn.is_idle());

    assert_eq!(
        sent(&log),
        "command_list_ok_begin\nadd \"a.mp3\"\nadd \"b.mp3\"\ncommand_list_end\n"
    );
}

#[test]
fn builders_stop_at_each_list_ok() {
    let (mut conn, _log) = connect(
        "file: a.mp3\nTitle: A\nlist_OK\nvolume: 10\nstate: stop\nlist_OK\nOK\n",
    );
    conn.list_ok_begin().unwrap();
    conn.send_current_song().unwrap();
    conn.send_status().unwrap();
    conn.list_end().unwrap();

    let song = conn.read_next_song().unwrap().expect("current song");
    assert_eq!(song.file, "a.mp3");
    assert_eq!(song.title.as_deref(), Some("A"));
    assert_eq!(conn.read_next_song().unwrap(), None);

    assert!(conn.next_list_ok_command().unwrap());
    let status = conn.read_status().unwrap().expect("status");
    assert_eq!(status.volume, 10);
    assert_eq!(status.state, PlayState::Stop);

    assert!(!conn.next_list_ok_command().unwrap());
    assert!(conn.is_idle());
    assert_eq!(conn.pending_list_oks(), 0);
}

#[test]
fn skipping_unread_list_output() {
    let (mut conn, _log) = connect("file: a.mp3\nlist_OK\nfile: b.mp3\nlist_OK\nOK\nOK\n");
    conn.list_ok_begin().unwrap();
    conn.send_current_song().unwrap();
    conn.send_current_song().unwrap();
    conn.list_end().unwrap();

    assert!(conn.next_list_ok_command().unwrap());
    assert!(!conn.next_list_ok_command().unwrap());
    assert!(conn.is_idle());
    conn.ping().unwrap();
}

#[test]
fn ack_inside_list_ends_response() {
    let (mut conn, _log) = connect("list_OK\nACK [50@1] {play} song doesn't exist\nOK\n");
    conn.list_ok_begin().unwrap();
    conn.send(&Command::new("ping")).unwrap();
    conn.send(&Command::new("play").arg(99)).unwrap();
    conn.send(&Command::new("ping")).unwrap();
    conn.list_end().unwrap();

    assert_eq!(conn.next_element().unwrap(), Reply::ListOk);
    let err = conn.next_element().unwrap_err();
    assert_eq!(err.ack().map(|ack| ack.position), Some(1));
    assert_eq!(conn.pending_list_oks(), 0);
    assert!(conn.is_idle());

    conn.ping().unwrap();
}

#[test]
fn stray_list_ok_is_reported_and_skipped() {
    let (mut conn, _log) = connect("list_OK\nOK\n");
    conn.list_begin().unwrap();
    conn.send(&Command::new("ping")).unwrap();
    conn.list_end().unwrap();

    assert!(matches!(
        conn.next_element(),
        Err(MpdError::Sequence(SequenceError::UnexpectedListOk))
    ));
    assert_eq!(conn.pending_list_oks(), 0);
    conn.finish_command().unwrap();
    assert!(conn.is_usable());
    assert!(conn.is_idle());
}

#[test]
fn missing_list_oks_are_reported() {
    let (mut conn, _log) = connect("list_OK\nOK\n");
    conn.list_ok_begin().unwrap();
    conn.send(&Command::new("ping")).unwrap();
    conn.send(&Command::new("ping")).unwrap();
    conn.list_end().unwrap();

    assert_eq!(conn.next_element().unwrap(), Reply::ListOk);
    assert!(matches!(
        conn.next_element(),
        Err(MpdError::Sequence(SequenceError::ExpectedMoreListOks))
    ));
    assert!(conn.is_idle());
    assert_eq!(conn.pending_list_oks(), 0);
}

#[test]
fn out_of_order_calls_do_not_disturb_the_response() {
    let (mut conn, log) = connect("volume: 20\nstate: pause\nOK\n");
    conn.send_status().unwrap();

    assert!(matches!(
        conn.send_stats(),
        Err(MpdError::Sequence(SequenceError::NotDoneProcessing))
    ));
    assert!(matches!(
        conn.list_ok_begin(),
        Err(MpdError::Sequence(SequenceError::NotDoneProcessing))
    ));
    assert!(matches!(
        conn.list_end(),
        Err(MpdError::Sequence(SequenceError::NotInListMode))
    ));
    assert_eq!(
        conn.last_error().map(|e| e.kind),
        Some(ErrorKind::Sequence)
    );
    assert_eq!(sent(&log), "status\n");

    let status = conn.read_status().unwrap().expect("status survives");
    assert_eq!(status.volume, 20);
    assert_eq!(status.state, PlayState::Pause);
    assert!(conn.is_idle());
}

#[test]
fn nested_list_is_rejected() {
    let (mut conn, _log) = connect("");
    conn.list_begin().unwrap();
    assert!(matches!(
        conn.list_ok_begin(),
        Err(MpdError::Sequence(SequenceError::AlreadyInListMode))
    ));
    assert_eq!(conn.list_mode(), ListMode::Plain);
}

#[test]
fn reading_an_idle_connection_is_already_done() {
    let (mut conn, _log) = connect("");
    assert!(matches!(
        conn.next_element(),
        Err(MpdError::Sequence(SequenceError::AlreadyDone))
    ));
    assert!(conn.is_usable());
}

#[test]
fn overrun_retires_the_connection() {
    let long = "x".repeat(100);
    let stream = Scripted::new(&format!("{}file: {long}\nOK\n", common::GREETING));
    let (mut conn, log) = connect_with(
        stream,
        ConnectOptions {
            buffer_capacity: 32,
            ..options()
        },
    );
    conn.send_list_all("").unwrap();

    assert!(matches!(
        conn.next_element(),
        Err(MpdError::BufferOverrun { capacity: 32 })
    ));
    assert!(!conn.is_usable());
    assert!(matches!(
        conn.send_ping(),
        Err(MpdError::Unusable(ErrorKind::BufferOverrun))
    ));
    assert!(matches!(
        conn.read_next_song(),
        Err(MpdError::Unusable(ErrorKind::BufferOverrun))
    ));
    assert_eq!(sent(&log), "listall \"\"\n");
}

#[test]
fn timeout_retires_the_connection() {
    let stream = Scripted::new(common::GREETING).stalling();
    let (mut conn, _log) = connect_with(
        stream,
        ConnectOptions {
            timeout: Duration::from_millis(30),
            ..options()
        },
    );
    conn.send_status().unwrap();
    assert!(matches!(conn.next_element(), Err(MpdError::Timeout)));
    assert_eq!(conn.last_error().map(|e| e.kind), Some(ErrorKind::Timeout));
    assert!(matches!(
        conn.status(),
        Err(MpdError::Unusable(ErrorKind::Timeout))
    ));
}

#[test]
fn commands_survive_partial_writes() {
    let stream = Scripted::new(&format!("{}OK\n", common::GREETING)).write_chunked(3);
    let (mut conn, log) = connect_with(stream, options());
    let command = Command::new("playlistadd")
        .arg("Road Trip")
        .arg("Queen/Jazz/01.flac");
    conn.send(&command).unwrap();
    conn.finish_command().unwrap();
    assert_eq!(
        sent(&log),
        "playlistadd \"Road Trip\" \"Queen/Jazz/01.flac\"\n"
    );
}

#[test]
fn interrupted_and_blocked_writes_are_retried() {
    let stream = Scripted::new(&format!("{}OK\n", common::GREETING))
        .write_fault(std::io::ErrorKind::Interrupted)
        .write_fault(std::io::ErrorKind::WouldBlock);
    let (mut conn, log) = connect_with(stream, options());
    conn.ping().unwrap();
    assert!(conn.is_usable());
    assert_eq!(sent(&log), "ping\n");
}

#[test]
fn interrupted_read_is_retried() {
    let stream = Scripted::new(&format!("{}OK\n", common::GREETING))
        .read_fault(std::io::ErrorKind::Interrupted);
    let (mut conn, _log) = connect_with(stream, options());
    assert_eq!(conn.server_version(), (0, 23, 5));
    conn.ping().unwrap();
}

#[test]
fn broken_pipe_is_a_fatal_send_error() {
    let stream = Scripted::new(common::GREETING).write_fault(std::io::ErrorKind::BrokenPipe);
    let (mut conn, _log) = connect_with(stream, options());
    assert!(matches!(conn.send_status(), Err(MpdError::Send(_))));
    assert!(!conn.is_usable());
    assert_eq!(conn.last_error().map(|e| e.kind), Some(ErrorKind::Send));
    assert!(matches!(
        conn.ping(),
        Err(MpdError::Unusable(ErrorKind::Send))
    ));
}

#[test]
fn stalled_writer_times_out() {
    let stream = Scripted::new(common::GREETING).stalling_writes();
    let (mut conn, log) = connect_with(
        stream,
        ConnectOptions {
            timeout: Duration::from_millis(30),
            ..options()
        },
    );
    assert!(matches!(conn.send_status(), Err(MpdError::Timeout)));
    assert!(!conn.is_usable());
    assert!(sent(&log).is_empty());
}

#[test]
fn lines_split_across_reads() {
    let stream = Scripted::new(&format!(
        "{}volume: 75\nstate: stop\nOK\n",
        common::GREETING
    ))
    .chunked(3);
    let (mut conn, _log) = connect_with(stream, options());
    let status = conn.status().unwrap();
    assert_eq!(status.volume, 75);
    assert_eq!(status.state, PlayState::Stop);
}

#[test]
fn finish_command_skips_undecodable_lines() {
    let (mut conn, _log) = connect("volume: 5\ngarbage line\nstate: play\nOK\nOK\n");
    conn.send_status().unwrap();
    assert!(matches!(conn.next_element(), Ok(Reply::Pair(_))));

    assert!(matches!(conn.finish_command(), Err(MpdError::Decode(_))));
    assert!(conn.is_usable());
    assert!(conn.is_idle());
    conn.ping().unwrap();
}

#[test]
fn run_collects_pairs() {
    let (mut conn, log) = connect("command: add\ncommand: play\nOK\n");
    let elements = conn.run(&Command::new("commands")).unwrap();
    let names: Vec<&str> = elements.iter().map(|e| e.value.as_str()).collect();
    assert_eq!(names, ["add", "play"]);
    assert_eq!(sent(&log), "commands\n");
}

#[test]
fn password_is_sent_quoted() {
    let (mut conn, log) = connect("OK\nACK [3@0] {password} incorrect password\n");
    conn.password("se\"cret").unwrap();
    let err = conn.password("wrong").unwrap_err();
    assert_eq!(err.ack().map(|ack| ack.code), Some(AckCode::Password));
    assert_eq!(sent(&log), "password \"se\\\"cret\"\npassword \"wrong\"\n");
}
