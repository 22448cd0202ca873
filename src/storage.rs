// storage.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::Path,
    thread,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{config::StorageSettings, error::StorageError, models::DevicePayload};

/// What travels from the controller to the storage worker.
#[derive(Debug)]
pub enum StorageMessage {
    Record(DevicePayload),
    /// Stop after everything enqueued before it has been written.
    Done,
}

#[derive(Serialize)]
struct StoredRecord<'a> {
    stored_at: DateTime<Utc>,
    #[serde(flatten)]
    payload: &'a DevicePayload,
}

/// Append-only log file. `flush` pushes each record to the OS, and to disk when `sync` is set.
pub struct LogFile {
    writer: BufWriter<File>,
    sync: bool,
}

impl LogFile {
    pub fn open(path: &Path, sync: bool) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            sync,
        })
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        if self.sync {
            self.writer.get_ref().sync_data()?;
        }
        Ok(())
    }
}

pub struct StorageWorker<W> {
    receiver: mpsc::UnboundedReceiver<StorageMessage>,
    writer: W,
}

impl<W: Write> StorageWorker<W> {
    pub fn new(receiver: mpsc::UnboundedReceiver<StorageMessage>, writer: W) -> Self {
        Self { receiver, writer }
    }

    /// Blocks on the channel until `Done` (or every sender is gone). Returns the number of records written.
    pub fn run(mut self) -> Result<u64, StorageError> {
        let mut written = 0;
        while let Some(message) = self.receiver.blocking_recv() {
            match message {
                StorageMessage::Record(payload) => {
                    self.append(&payload)?;
                    written += 1;
                }
                StorageMessage::Done => {
                    debug!("Storage worker received done signal");
                    break;
                }
            }
        }
        Ok(written)
    }

    fn append(&mut self, payload: &DevicePayload) -> Result<(), StorageError> {
        let record = StoredRecord {
            stored_at: Utc::now(),
            payload,
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        debug!(device_id = %payload.device_id, "Stored payload");
        Ok(())
    }
}

/// Hands payloads from the ingestion loop to a storage worker on its own thread.
pub struct StorageRelay {
    sender: mpsc::UnboundedSender<StorageMessage>,
    worker: Option<thread::JoinHandle<Result<u64, StorageError>>>,
}

impl StorageRelay {
    pub fn open(settings: &StorageSettings) -> Result<Self, StorageError> {
        let log = LogFile::open(Path::new(&settings.path), settings.sync)?;
        info!(path = %settings.path, "Storage log opened");
        Self::spawn(log)
    }

    pub fn spawn<W: Write + Send + 'static>(writer: W) -> Result<Self, StorageError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = StorageWorker::new(receiver, writer);
        let handle = thread::Builder::new()
            .name("storage-worker".into())
            .spawn(move || {
                let result = worker.run();
                if let Err(e) = &result {
                    error!("Storage worker failed: {}", e);
                }
                result
            })?;
        Ok(Self {
            sender,
            worker: Some(handle),
        })
    }

    pub fn enqueue(&self, payload: DevicePayload) -> Result<(), StorageError> {
        self.sender
            .send(StorageMessage::Record(payload))
            .map_err(|_| StorageError::WorkerStopped)
    }

    /// Sends `Done` and waits for the worker to drain and exit.
    pub async fn shutdown(mut self) -> Result<u64, StorageError> {
        // A failed send means the worker already exited; joining reports why.
        let _ = self.sender.send(StorageMessage::Done);
        let Some(handle) = self.worker.take() else {
            return Ok(0);
        };
        let joined = tokio::task::spawn_blocking(move || handle.join())
            .await
            .map_err(|_| StorageError::WorkerPanicked)?;
        let written = joined.map_err(|_| StorageError::WorkerPanicked)??;
        info!(written, "Storage worker stopped");
        Ok(written)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    /// In-memory writer whose contents stay readable after the worker consumed it.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    pub struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
