//! Relay pump: bridges local stdio with engine connections (swarm mode).

use std::io;

use swarmctl_engine_api::EngineConnection;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Mirror `input` into the connection and the connection into `output`,
/// concurrently and independently. Either side reaching end-of-stream ends
/// the mirrored direction: local input EOF shuts down the connection's
/// write half, remote EOF simply finishes the output copy. A failure in one
/// direction does not block the other.
///
/// Returns the byte counts (sent, received), or the first error observed in
/// send-then-receive order.
pub async fn pump<I, O, S>(input: I, output: O, stream: S) -> io::Result<(u64, u64)>
where
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut remote_rd, mut remote_wr) = tokio::io::split(stream);
    let mut input = input;
    let mut output = output;

    let outbound = async {
        let sent = tokio::io::copy(&mut input, &mut remote_wr).await?;
        remote_wr.shutdown().await?;
        Ok::<u64, io::Error>(sent)
    };
    let inbound = async {
        let received = tokio::io::copy(&mut remote_rd, &mut output).await?;
        output.flush().await?;
        Ok::<u64, io::Error>(received)
    };

    let (sent, received) = tokio::join!(outbound, inbound);
    Ok((sent?, received?))
}

/// Attaches each accepted engine connection to the process's stdio and logs
/// the outcome with a per-connection sequence number. A finished or failed
/// connection never terminates the process; a relay may serve several
/// connections over its lifetime.
#[derive(Debug, Default)]
pub struct RelayPump {
    next_seq: u64,
}

impl RelayPump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bridge one connection. The returned handle completes when both
    /// directions have ended.
    pub fn attach(&mut self, conn: EngineConnection) -> JoinHandle<()> {
        let seq = self.next_seq;
        self.next_seq += 1;
        info!(id = seq, initiator = conn.initiator, "connection start");
        tokio::spawn(async move {
            match pump(tokio::io::stdin(), tokio::io::stdout(), conn.stream).await {
                Ok((sent, received)) => {
                    info!(id = seq, sent, received, "connection end");
                }
                Err(err) => {
                    warn!(id = seq, error = %err, "connection end");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn pump_mirrors_both_directions() {
        // local <-> remote through an in-memory duplex pair.
        let (near, far) = tokio::io::duplex(64);

        let local_input: &[u8] = b"ping from local";
        let mut local_output = Vec::new();

        let remote = tokio::spawn(async move {
            let (mut rd, mut wr) = tokio::io::split(far);
            wr.write_all(b"pong from remote").await.unwrap();
            wr.shutdown().await.unwrap();
            let mut seen = Vec::new();
            rd.read_to_end(&mut seen).await.unwrap();
            seen
        });

        let (sent, received) = pump(local_input, &mut local_output, near).await.unwrap();
        assert_eq!(sent, b"ping from local".len() as u64);
        assert_eq!(received, b"pong from remote".len() as u64);
        assert_eq!(local_output, b"pong from remote");
        assert_eq!(remote.await.unwrap(), b"ping from local");
    }

    #[tokio::test]
    async fn remote_eof_does_not_stall_outbound() {
        let (near, far) = tokio::io::duplex(64);

        // Remote closes its write direction immediately but keeps reading.
        let remote = tokio::spawn(async move {
            let (mut rd, mut wr) = tokio::io::split(far);
            wr.shutdown().await.unwrap();
            let mut seen = Vec::new();
            rd.read_to_end(&mut seen).await.unwrap();
            seen
        });

        let mut local_output = Vec::new();
        let (sent, received) = pump(&b"still sent"[..], &mut local_output, near)
            .await
            .unwrap();
        assert_eq!(sent, b"still sent".len() as u64);
        assert_eq!(received, 0);
        assert!(local_output.is_empty());
        assert_eq!(remote.await.unwrap(), b"still sent");
    }
}
