use std::io::Write;

use tokio::sync::broadcast;
use tracing_subscriber::fmt::MakeWriter;

/// Capacity of the log broadcast channel behind `/api/logs`.
pub(crate) const LOG_CHANNEL_CAPACITY: usize = 500;

/// Tees formatted log lines to stdout and to every `/api/logs` subscriber.
#[derive(Clone)]
pub(crate) struct BroadcastMakeWriter {
    pub sender: broadcast::Sender<String>,
    pub echo_stdout: bool,
}

impl<'a> MakeWriter<'a> for BroadcastMakeWriter {
    type Writer = BroadcastWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BroadcastWriter {
            sender: self.sender.clone(),
            echo_stdout: self.echo_stdout,
        }
    }
}

pub(crate) struct BroadcastWriter {
    sender: broadcast::Sender<String>,
    echo_stdout: bool,
}

impl Write for BroadcastWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let line = String::from_utf8_lossy(buf).trim_end().to_string();
        if !line.is_empty() {
            // No subscribers is fine.
            let _ = self.sender.send(line);
        }
        if self.echo_stdout {
            std::io::stdout().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if self.echo_stdout {
            std::io::stdout().flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_reach_subscribers_without_trailing_newline() {
        let (sender, mut rx) = broadcast::channel(4);
        let make = BroadcastMakeWriter {
            sender,
            echo_stdout: false,
        };
        let mut writer = make.make_writer();
        writer.write_all(b"INFO cardsmith: started\n").unwrap();
        writer.write_all(b"\n").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "INFO cardsmith: started");
        assert!(rx.try_recv().is_err());
    }
}
