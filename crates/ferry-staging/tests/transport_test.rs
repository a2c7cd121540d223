//! Tests for the FTP and HTTP transports against local sockets.

use std::io::{BufRead, BufReader, Write};
use std::thread::{self, JoinHandle};

use ferry_artifact::File;
use ferry_dataflow::AppError;
use ferry_staging::{FtpTransport, HttpTransport, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves one HTTP response, then closes. Returns the base URL.
async fn serve_once(status: &'static str, body: &'static [u8]) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();

  tokio::spawn(async move {
    let (mut socket, _) = listener.accept().await.unwrap();

    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
      let n = socket.read(&mut buf).await.unwrap();
      if n == 0 {
        break;
      }
      request.extend_from_slice(&buf[..n]);
    }

    let head = format!(
      "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
      status,
      body.len()
    );
    socket.write_all(head.as_bytes()).await.unwrap();
    socket.write_all(body).await.unwrap();
    socket.shutdown().await.unwrap();
  });

  format!("http://{}", addr)
}

fn http_transport() -> HttpTransport {
  HttpTransport::new(reqwest::Client::builder().no_proxy().build().unwrap())
}

#[tokio::test]
async fn test_http_fetch_writes_body() {
  let body: &'static [u8] = b"id,value\n1,alpha\n2,beta\n\x00\xff";
  let base = serve_once("200 OK", body).await;
  let dir = tempfile::tempdir().unwrap();
  let dest = dir.path().join("table.csv");

  let file = File::new(format!("{}/data/table.csv", base)).unwrap();
  let written = http_transport().fetch(&file, &dest).await.unwrap();

  assert_eq!(written, body.len() as u64);
  assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[tokio::test]
async fn test_http_fetch_rejects_error_status() {
  let base = serve_once("404 Not Found", b"missing").await;
  let dir = tempfile::tempdir().unwrap();
  let dest = dir.path().join("table.csv");

  let file = File::new(format!("{}/data/table.csv", base)).unwrap();
  let err = http_transport().fetch(&file, &dest).await.unwrap_err();

  match err {
    AppError::Transfer { url, message } => {
      assert_eq!(url, file.url());
      assert!(message.contains("404"), "{}", message);
    }
    other => panic!("expected transfer error, got {:?}", other),
  }
  assert!(!dest.exists());
}

#[tokio::test]
async fn test_ftp_fetch_connection_refused() {
  // Bind then drop, so the port is known to have no listener.
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let port = listener.local_addr().unwrap().port();
  drop(listener);

  let dir = tempfile::tempdir().unwrap();
  let dest = dir.path().join("input.txt");
  let file = File::new(format!("ftp://127.0.0.1:{}/pub/input.txt", port)).unwrap();

  let err = FtpTransport.fetch(&file, &dest).await.unwrap_err();
  assert!(
    matches!(&err, AppError::Transfer { url, .. } if url == file.url()),
    "{:?}",
    err
  );
  assert!(!dest.exists());
}

/// A scripted single-session FTP server. Serves `body` for `RETR <name>` and
/// 550 for any other file. Returns the control port and the commands seen.
fn serve_ftp(name: &'static str, body: Vec<u8>) -> (u16, JoinHandle<Vec<String>>) {
  let control = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
  let port = control.local_addr().unwrap().port();

  let server = thread::spawn(move || {
    let (stream, _) = control.accept().unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = stream;
    let data = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let data_port = data.local_addr().unwrap().port();

    let mut reply = |line: String| {
      writer.write_all(format!("{}\r\n", line).as_bytes()).unwrap();
    };
    reply("220 ready".to_string());

    let mut commands = Vec::new();
    loop {
      let mut line = String::new();
      if reader.read_line(&mut line).unwrap() == 0 {
        break;
      }
      let command = line.trim_end().to_string();
      commands.push(command.clone());

      let (verb, arg) = command.split_once(' ').unwrap_or((command.as_str(), ""));
      match verb {
        "USER" => reply("331 password required".to_string()),
        "PASS" => reply("230 logged in".to_string()),
        "CWD" => reply("250 directory changed".to_string()),
        "TYPE" => reply("200 type set".to_string()),
        "PASV" => reply(format!(
          "227 Entering Passive Mode (127,0,0,1,{},{})",
          data_port / 256,
          data_port % 256
        )),
        "RETR" if arg == name => {
          reply("150 opening data connection".to_string());
          let (mut conn, _) = data.accept().unwrap();
          for chunk in body.chunks(8192) {
            conn.write_all(chunk).unwrap();
          }
          drop(conn);
          reply("226 transfer complete".to_string());
        }
        "RETR" => reply("550 no such file".to_string()),
        "QUIT" => {
          reply("221 bye".to_string());
          break;
        }
        _ => reply("502 not implemented".to_string()),
      }
    }
    commands
  });

  (port, server)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ftp_fetch_streams_into_dest() {
  let body: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
  let (port, server) = serve_ftp("input.bin", body.clone());

  let dir = tempfile::tempdir().unwrap();
  let dest = dir.path().join("input.bin");
  let file = File::new(format!("ftp://127.0.0.1:{}/pub/data/input.bin", port)).unwrap();

  let written = FtpTransport.fetch(&file, &dest).await.unwrap();

  assert_eq!(written, body.len() as u64);
  assert_eq!(std::fs::read(&dest).unwrap(), body);

  let commands = server.join().unwrap();
  assert_eq!(commands[0], "USER anonymous");
  assert!(commands.contains(&"CWD /pub/data".to_string()), "{:?}", commands);
  assert!(commands.contains(&"RETR input.bin".to_string()), "{:?}", commands);
  assert_eq!(commands.last().map(String::as_str), Some("QUIT"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ftp_fetch_missing_file_still_quits() {
  let (port, server) = serve_ftp("input.bin", b"unused".to_vec());

  let dir = tempfile::tempdir().unwrap();
  let dest = dir.path().join("missing.bin");
  let file = File::new(format!("ftp://127.0.0.1:{}/pub/missing.bin", port)).unwrap();

  let err = FtpTransport.fetch(&file, &dest).await.unwrap_err();
  assert!(matches!(err, AppError::Transfer { .. }), "{:?}", err);

  let commands = server.join().unwrap();
  assert!(commands.contains(&"RETR missing.bin".to_string()), "{:?}", commands);
  assert_eq!(commands.last().map(String::as_str), Some("QUIT"));
}
