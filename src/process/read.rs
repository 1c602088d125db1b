use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Read a child pipe to EOF. An absent pipe yields `None`.
pub(crate) async fn drain<R>(pipe: Option<R>) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return Ok(None);
    };

    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf).await?;
    Ok(Some(buf))
}
