//! Canned HTTP responses on a loopback port.

use testresult::TestResult;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

/// Serves each `(status, body)` pair to one connection, in order, and returns the base URL.
pub async fn serve(responses: Vec<(u16, &'static str)>) -> TestResult<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };

            let mut buf = [0_u8; 4096];

            if socket.read(&mut buf).await.is_err() {
                return;
            }

            let response = format!(
                "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );

            if socket.write_all(response.as_bytes()).await.is_err()
                || socket.shutdown().await.is_err()
            {
                return;
            }
        }
    });

    Ok(format!("http://{addr}"))
}
