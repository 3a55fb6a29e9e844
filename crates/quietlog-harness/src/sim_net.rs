//! Trust domains behind turmoil's simulated TCP.
//!
//! Each request is one share, each response one padded answer, both carried
//! as length-prefixed CBOR:
//!
//! ```text
//! [len: u32 BE][CBOR body: len bytes]
//! ```
//!
//! One share per connection. The framing only exists to exercise the records
//! over a lossy, reordering network; it is not a deployment protocol.

use std::sync::Arc;

use quietlog_client::{ReadArgs, ReadReply};
use quietlog_proto::PirArgs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use turmoil::net::{TcpListener, TcpStream};

use crate::{error::HarnessError, sim_log::SimLog, sim_trust_domain::SimTrustDomain};

/// Largest frame either side accepts.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Write one length-prefixed frame.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    body: &[u8],
) -> Result<(), HarnessError> {
    if body.len() > MAX_FRAME_LEN {
        return Err(HarnessError::FrameTooLarge { len: body.len(), max: MAX_FRAME_LEN });
    }
    writer.write_u32(body.len() as u32).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, HarnessError> {
    let len = reader.read_u32().await? as usize;
    if len > MAX_FRAME_LEN {
        return Err(HarnessError::FrameTooLarge { len, max: MAX_FRAME_LEN });
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Answer shares on `listener` until the simulation ends.
///
/// A connection that sends a bad share is logged and closed; the server keeps
/// accepting.
pub async fn serve(
    listener: TcpListener,
    trust_domain: SimTrustDomain,
    log: Arc<SimLog>,
) -> Result<(), HarnessError> {
    loop {
        let (mut stream, peer) = listener.accept().await?;

        if let Err(e) = answer_one(&mut stream, &trust_domain, &log).await {
            tracing::warn!(trust_domain = trust_domain.name(), %peer, error = %e, "Share rejected");
        }
    }
}

async fn answer_one(
    stream: &mut TcpStream,
    trust_domain: &SimTrustDomain,
    log: &SimLog,
) -> Result<(), HarnessError> {
    let share = PirArgs::from_cbor(&read_frame(stream).await?)?;
    let answer = trust_domain.answer(log, &share)?;
    write_frame(stream, &ReadReply::new(answer).to_cbor()?).await
}

/// Send one share to the trust domain at `address` and return its answer.
pub async fn fetch_answer(address: &str, share: &PirArgs) -> Result<ReadReply, HarnessError> {
    let mut stream = TcpStream::connect(address).await?;
    write_frame(&mut stream, &share.to_cbor()?).await?;
    Ok(ReadReply::from_cbor(&read_frame(&mut stream).await?)?)
}

/// Fetch every share of `args` from `addresses` (same order) and XOR the
/// answers into one reply.
pub async fn fetch_reply(addresses: &[String], args: &ReadArgs) -> Result<ReadReply, HarnessError> {
    if addresses.len() != args.num_trust_domains() {
        return Err(HarnessError::ShareCount {
            shares: args.num_trust_domains(),
            trust_domains: addresses.len(),
        });
    }

    let mut combined = Vec::new();
    for (index, (address, share)) in addresses.iter().zip(&args.td).enumerate() {
        let answer = fetch_answer(address, share).await?.data;
        if index == 0 {
            combined = answer;
            continue;
        }
        for (acc, byte) in combined.iter_mut().zip(&answer) {
            *acc ^= byte;
        }
    }

    Ok(ReadReply::new(combined))
}
