use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream};

/// Re-frame a byte stream so no item exceeds `chunk_size` bytes.
///
/// Splitting is zero-copy; errors pass through in order.
pub fn rechunk<S, E>(input: S, chunk_size: usize) -> impl Stream<Item = Result<Bytes, E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    let chunk_size = chunk_size.max(1);
    input.flat_map(move |item| {
        let frames = match item {
            Ok(bytes) => split(bytes, chunk_size).into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };
        stream::iter(frames)
    })
}

fn split(mut bytes: Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut frames = Vec::with_capacity(bytes.len().div_ceil(chunk_size));
    while bytes.len() > chunk_size {
        frames.push(bytes.split_to(chunk_size));
    }
    if !bytes.is_empty() {
        frames.push(bytes);
    }
    frames
}
