//! Terminal formatting for decoded records and headers

use crate::codec::{Header, Position, PositionKind, Positions, RecordKind, Span, TokenRecord};
use crate::utils::to_hex;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Stdout stream honoring the color setting
pub fn stdout(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Print a decoded record, resolving positions against `start`
pub fn print_record<W: WriteColor>(out: &mut W, record: &TokenRecord, start: Position) -> io::Result<()> {
    print_label(out, "id")?;
    writeln!(out, "{}", record.id)?;

    print_label(out, "positions")?;
    match &record.positions {
        Positions::Single => writeln!(out, "single {}", start)?,
        Positions::Range { length } => match record.positions.bounds(start) {
            Some((first, last)) => writeln!(out, "range {}..={} ({} positions)", first, last, length)?,
            None => writeln!(out, "range (empty)")?,
        },
        Positions::Set { positions } => {
            let list: Vec<String> = positions.iter().map(|p| p.to_string()).collect();
            writeln!(out, "set [{}]", list.join(", "))?;
        }
        Positions::None => writeln!(out, "none")?,
    }

    if let Some(span) = record.offset {
        print_label(out, "offset")?;
        print_span(out, span)?;
    }
    if let Some(span) = record.real_offset {
        print_label(out, "real offset")?;
        print_span(out, span)?;
    }
    if let Some(parent_id) = record.parent_id {
        print_label(out, "parent")?;
        writeln!(out, "{}", parent_id)?;
    }
    if let Some(payload) = &record.payload {
        print_label(out, "payload")?;
        write!(out, "{} bytes", payload.len())?;
        if !payload.is_empty() {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            write!(out, " {}", to_hex(payload))?;
            out.reset()?;
        }
        writeln!(out)?;
    }

    Ok(())
}

/// Print the header bits of an encoded record
pub fn print_header<W: WriteColor>(out: &mut W, header: &Header, encoded_len: usize) -> io::Result<()> {
    let kind = match header.position_kind {
        PositionKind::Single => "single",
        PositionKind::Range => "range",
        PositionKind::Set => "set",
        PositionKind::None => "none",
    };
    let (first, second) = header.position_kind.to_bits();

    print_bit_row(out, "0-1", "position kind", &format!("{}{} {}", first as u8, second as u8, kind))?;
    print_bit_row(out, "2", "offset", flag(header.has_offset))?;
    print_bit_row(out, "3", "real offset", flag(header.has_real_offset))?;
    print_bit_row(out, "4", "parent", flag(header.has_parent))?;
    print_bit_row(out, "5", "payload", flag(header.has_payload))?;
    let record_kind = match header.record_kind {
        RecordKind::PlainToken => "0 plain token",
        RecordKind::Reserved => "1 reserved (unsupported)",
    };
    print_bit_row(out, "6", "record kind", record_kind)?;

    print_label(out, "length")?;
    writeln!(out, "{} bytes ({} header bits)", encoded_len, Header::BITS)?;
    Ok(())
}

fn flag(set: bool) -> &'static str {
    if set { "1 present" } else { "0 absent" }
}

fn print_bit_row<W: WriteColor>(out: &mut W, bits: &str, name: &str, value: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "bit {:<4}", bits)?;
    out.reset()?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    write!(out, "{:<14}", name)?;
    out.reset()?;
    writeln!(out, "{}", value)
}

fn print_label<W: WriteColor>(out: &mut W, label: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    write!(out, "{:<12}", format!("{}:", label))?;
    out.reset()
}

fn print_span<W: WriteColor>(out: &mut W, span: Span) -> io::Result<()> {
    writeln!(out, "{}..={} ({} chars)", span.start, span.end, span.len())
}
