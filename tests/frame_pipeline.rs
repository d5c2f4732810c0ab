//! Producer and consumer wired together the way an embedding host runs them: an emit buffer
//! flushing mid-frame into a canvas that keeps state for the whole frame.

use onimate::draw::{RecordingRenderer, RenderCall};
use onimate::protocol::{Ellipse, PenConfig, Rect, TextRun};
use onimate::{Canvas, DrawCmd, DrawError, EmitBuffer, StateScope, StringTable};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// One frame of a small scene: a clipped rect, a label and an ellipse.
fn scene(strings: &mut StringTable, frame: usize) -> Vec<DrawCmd> {
    vec![
        DrawCmd::Config(PenConfig { line_width: 2.0 }),
        DrawCmd::ClipPush,
        DrawCmd::ClipStart,
        DrawCmd::Rect(Rect {
            x1: 0.0,
            y1: 0.0,
            x2: 100.0,
            y2: 100.0,
        }),
        DrawCmd::ClipEnd,
        DrawCmd::Text(TextRun {
            x: 4.0,
            y: 16.0,
            size: 12.0,
            text: strings.alloc(format!("frame {frame}")),
        }),
        DrawCmd::Ellipse(Ellipse {
            x: 50.0,
            y: 50.0,
            rx: 10.0,
            ry: 10.0,
            rotation: 0.0,
        }),
        DrawCmd::ClipPop(PenConfig { line_width: 1.0 }),
    ]
}

fn run_frames(capacity_slots: usize, frames: usize) -> (Vec<RenderCall>, usize) {
    let mut canvas = Canvas::new(RecordingRenderer::new());
    let mut strings = StringTable::new();
    let mut emit = EmitBuffer::with_capacity(capacity_slots);
    let mut passes = 0;

    for frame in 0..frames {
        canvas.frame_start();
        for cmd in scene(&mut strings, frame) {
            if let Some(buffer) = emit.push(&cmd).unwrap() {
                canvas.draw(&buffer, &mut strings).unwrap();
                passes += 1;
            }
        }
        if let Some(buffer) = emit.flush() {
            canvas.draw(&buffer, &mut strings).unwrap();
            passes += 1;
        }
        let totals = canvas.end_frame().unwrap();
        assert_eq!(totals.texts, 1);
        assert_eq!(strings.live(), 0);
    }
    (canvas.into_renderer().take_calls(), passes)
}

#[test]
fn mid_frame_flushes_do_not_change_what_is_drawn() {
    init_tracing();
    let (whole, whole_passes) = run_frames(onimate::protocol::DEFAULT_EMIT_CAPACITY_SLOTS, 3);
    // Room for two records per buffer forces several flushes per frame.
    let (split, split_passes) = run_frames(21, 3);

    assert_eq!(whole_passes, 3);
    assert!(split_passes > whole_passes);
    assert_eq!(whole, split);
    assert_eq!(
        whole
            .iter()
            .filter(|c| matches!(c, RenderCall::FrameStart))
            .count(),
        3
    );
}

#[test]
fn pass_scope_rejects_state_split_by_a_flush() {
    init_tracing();
    let mut canvas = Canvas::with_config(
        RecordingRenderer::new(),
        onimate::DrawConfig::new().state_scope(StateScope::Pass),
    );
    let mut strings = StringTable::new();
    let mut emit = EmitBuffer::with_capacity(21);

    canvas.frame_start();
    let mut first_error = None;
    for cmd in scene(&mut strings, 0) {
        if let Some(buffer) = emit.push(&cmd).unwrap() {
            if let Err(err) = canvas.draw(&buffer, &mut strings) {
                first_error.get_or_insert(err);
            }
        }
    }
    assert!(matches!(
        first_error,
        Some(DrawError::UnbalancedClipStack { .. })
    ));
    strings.reclaim();
}

#[test]
fn capture_file_replays_to_the_same_calls() -> anyhow::Result<()> {
    init_tracing();
    let mut recorder = onimate_replay::CaptureRecorder::new();
    let mut strings = StringTable::new();
    recorder.frame_start();
    for cmd in scene(&mut strings, 0) {
        match cmd {
            DrawCmd::Text(run) => {
                let text = strings.take(run.text)?;
                recorder.text(run.x, run.y, run.size, text)?;
            }
            other => recorder.push(&other)?,
        }
    }

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scene.json");
    std::fs::write(&path, recorder.finish().to_json()?)?;
    let capture = onimate_replay::Capture::from_json(&std::fs::read_to_string(&path)?)?;

    let reports =
        onimate_replay::replay_capture(&capture, &onimate_replay::ReplayOptions::default())?;
    let (direct, _) = run_frames(onimate::protocol::DEFAULT_EMIT_CAPACITY_SLOTS, 1);
    assert_eq!(reports[0].calls, direct);
    assert_eq!(
        reports[0].sha256,
        onimate_replay::call_log_digest(&direct)?
    );
    Ok(())
}
