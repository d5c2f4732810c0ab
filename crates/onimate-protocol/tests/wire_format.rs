use onimate_protocol::{
    decode_all, Bezier, CmdStreamIter, CmdWriter, DecodeError, DrawCmd, Ellipse, Matrix, Opcode,
    PenConfig, Rect, StringRef, StringTable, TextRun, OPCODE_TABLE, SLOT_BYTES,
};

fn push_u64_le(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_f64_le(out: &mut Vec<u8>, v: f64) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_record(out: &mut Vec<u8>, opcode: u64, fields: &[f64], payload_slots: usize) {
    assert!(fields.len() <= payload_slots);
    push_u64_le(out, opcode);
    for &v in fields {
        push_f64_le(out, v);
    }
    for _ in fields.len()..payload_slots {
        push_u64_le(out, 0);
    }
}

#[test]
fn writer_matches_hand_built_bytes() {
    let mut strings = StringTable::new();
    let label = strings.alloc("label");

    let mut w = CmdWriter::new();
    w.matrix(1.0, 0.0, 0.0, 1.0, 10.0, 20.0);
    w.config(2.0);
    w.ellipse(0.0, 0.0, 10.0, 10.0, 0.0);
    w.text(5.0, 6.0, 14.0, label);
    w.clip_pop(3.0);
    let buf = w.finish();

    let mut expected = Vec::new();
    push_record(&mut expected, 4, &[1.0, 0.0, 0.0, 1.0, 10.0, 20.0], 8);
    push_record(&mut expected, 3, &[2.0], 8);
    push_record(&mut expected, 1, &[0.0, 0.0, 10.0, 10.0, 0.0], 8);
    push_u64_le(&mut expected, 5);
    push_f64_le(&mut expected, 5.0);
    push_f64_le(&mut expected, 6.0);
    push_f64_le(&mut expected, 14.0);
    push_u64_le(&mut expected, label.to_raw());
    for _ in 0..5 {
        push_u64_le(&mut expected, 0);
    }
    push_record(&mut expected, 9, &[3.0], 8);
    push_u64_le(&mut expected, 0);

    assert_eq!(buf, expected);
    assert_eq!(buf.len() % SLOT_BYTES, 0);
}

#[test]
fn every_opcode_decodes_what_the_writer_encodes() {
    let cmds = [
        DrawCmd::Ellipse(Ellipse {
            x: 1.0,
            y: 2.0,
            rx: 3.0,
            ry: 4.0,
            rotation: 0.25,
        }),
        DrawCmd::Bezier(Bezier {
            x1: 0.0,
            y1: 1.0,
            cx1: 2.0,
            cy1: 3.0,
            cx2: 4.0,
            cy2: 5.0,
            x2: 6.0,
            y2: 7.0,
        }),
        DrawCmd::Config(PenConfig { line_width: 1.5 }),
        DrawCmd::Matrix(Matrix::scale(2.0, 3.0)),
        DrawCmd::Text(TextRun {
            x: 1.0,
            y: 2.0,
            size: 12.0,
            text: StringRef::from_raw(0x0000_0001_0000_0003),
        }),
        DrawCmd::ClipPush,
        DrawCmd::ClipStart,
        DrawCmd::ClipEnd,
        DrawCmd::ClipPop(PenConfig { line_width: 4.0 }),
        DrawCmd::Rect(Rect {
            x1: -1.0,
            y1: -2.0,
            x2: 3.0,
            y2: 4.0,
        }),
    ];

    let mut w = CmdWriter::new();
    for cmd in &cmds {
        w.push(cmd);
    }
    let buf = w.finish();

    let records = decode_all(&buf).unwrap();
    let mut expected_offset = 0;
    for (record, cmd) in records.iter().zip(&cmds) {
        assert_eq!(record.offset, expected_offset);
        assert_eq!(&record.cmd, cmd);
        expected_offset += record.record_bytes();
    }
    assert_eq!(records.len(), cmds.len());
    assert_eq!(expected_offset + Opcode::End.record_bytes(), buf.len());
}

#[test]
fn table_covers_every_wire_value_in_order() {
    let names: Vec<_> = OPCODE_TABLE.iter().map(|l| l.name).collect();
    assert_eq!(
        names,
        [
            "END",
            "ELLIPSE",
            "BEZIER",
            "CONFIG",
            "MATRIX",
            "TEXT",
            "CLIP_PUSH",
            "CLIP_START",
            "CLIP_END",
            "CLIP_POP",
            "RECT"
        ]
    );
    assert_eq!(Opcode::Ellipse.layout().reserved_slots(), 3);
    assert_eq!(Opcode::Text.layout().reserved_slots(), 5);
    assert_eq!(Opcode::ClipPush.layout().reserved_slots(), 8);
}

#[test]
fn unknown_tag_mid_stream_reports_its_offset() {
    let mut buf = Vec::new();
    push_record(&mut buf, 10, &[0.0, 0.0, 1.0, 1.0], 8);
    push_u64_le(&mut buf, 0x0B);
    push_u64_le(&mut buf, 0);

    let mut iter = CmdStreamIter::new(&buf);
    assert!(iter.next().unwrap().is_ok());
    assert_eq!(
        iter.next().unwrap(),
        Err(DecodeError::UnknownOpcode {
            offset: 72,
            tag: 0x0B
        })
    );
    assert!(iter.next().is_none());
    assert!(!iter.terminated());
}

#[cfg(not(target_arch = "wasm32"))]
mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn arbitrary_bytes_never_overread(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut iter = CmdStreamIter::new(&bytes);
            let mut steps = 0usize;
            for item in iter.by_ref() {
                steps += 1;
                if item.is_err() {
                    break;
                }
            }
            prop_assert!(iter.consumed() <= bytes.len());
            // Every successful step consumes at least one full record.
            prop_assert!(steps <= bytes.len() / SLOT_BYTES + 1);
        }

        #[test]
        fn tags_past_the_table_are_rejected(tag in 11u64..) {
            let mut buf = Vec::new();
            push_u64_le(&mut buf, tag);
            push_u64_le(&mut buf, 0);
            prop_assert_eq!(
                decode_all(&buf),
                Err(DecodeError::UnknownOpcode { offset: 0, tag })
            );
        }
    }
}
