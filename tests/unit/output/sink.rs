use super::*;
use crate::stage::layout::StageLayout;

struct FailingSink;

impl FrameSink for FailingSink {
    fn send_frame(&mut self, _frame: &Frame) -> HaloResult<()> {
        Err(HaloError::io("unplugged"))
    }
}

#[test]
fn in_memory_clones_share_frames() {
    let sink = InMemorySink::new();
    let mut owned = sink.clone();
    let f = Frame::black(&StageLayout::default());
    owned.send_frame(&f).unwrap();
    owned.send_frame(&f).unwrap();
    assert_eq!(sink.len(), 2);
    assert!(sink.last().unwrap().ptr_eq(&f));
}

#[test]
fn raw_file_sink_appends_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("live.raw");
    let layout = StageLayout {
        strips: 2,
        pixels_per_strip: 2,
        inner_radius_ratio: 0.1,
    };
    let mut sink = RawFileSink::create(&path).unwrap();
    sink.send_frame(&Frame::solid(&layout, 1, 2, 3)).unwrap();
    sink.send_frame(&Frame::black(&layout)).unwrap();
    sink.finish().unwrap();
    assert_eq!(sink.frames_written(), 2);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 2 * layout.frame_len());
    assert_eq!(&bytes[..3], &[1, 2, 3]);
}

#[test]
fn publish_routes_frames_and_survives_failures() {
    let live_preview = InMemorySink::new();
    let ready_preview = InMemorySink::new();
    let mut outputs = Outputs {
        hardware: Box::new(FailingSink),
        live_preview: Box::new(live_preview.clone()),
        ready_preview: Box::new(ready_preview.clone()),
    };
    let layout = StageLayout::default();
    let live = Frame::solid(&layout, 9, 9, 9);
    let ready = Frame::black(&layout);

    outputs.publish(&live, &ready);
    assert_eq!(live_preview.last(), Some(live));
    assert_eq!(ready_preview.last(), Some(ready));
}
