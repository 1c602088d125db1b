use std::io;

use tokio::{io::AsyncWriteExt, process::ChildStdin};

use crate::stream::Literal;

/// Write `literal` into the child's stdin, then close it.
///
/// A child that exits without reading all of its input is not an error; the
/// write simply stops at the broken pipe. Without a literal the pipe is closed
/// straight away so the child sees EOF.
pub(crate) async fn feed(stdin: Option<ChildStdin>, literal: Option<Literal>) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };

    let Some(literal) = literal else {
        return Ok(());
    };

    trace!(len = literal.as_bytes().len(), "feeding literal input");

    let res = async {
        stdin.write_all(literal.as_bytes()).await?;
        stdin.flush().await?;
        stdin.shutdown().await
    }
    .await;

    match res {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            trace!("child closed stdin before consuming all input");
            Ok(())
        }
        other => other,
    }
}
