use anyhow::Result;
use std::io::Write;

use crate::state::Packet;

/// Export packets as newline-delimited wire JSON, readable by the capture feed
pub fn export_json<'a, W, I>(packets: I, mut writer: W) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Packet>,
{
    for packet in packets {
        serde_json::to_writer(&mut writer, packet)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
