use super::*;

fn tiny() -> StageLayout {
    StageLayout {
        strips: 2,
        pixels_per_strip: 1,
        inner_radius_ratio: 0.0,
    }
}

fn numbered(layout: &StageLayout, n: u8) -> Vec<Frame> {
    (0..n).map(|i| Frame::solid(layout, i, i, i)).collect()
}

#[test]
fn consume_loops_and_reports_position() {
    let layout = tiny();
    let mut lib = InMemoryVideoLibrary::new();
    lib.insert_track("clip", numbered(&layout, 3));

    let player = lib.player("p1").unwrap();
    assert_eq!(player.consume_frame(), None);
    assert_eq!(player.playing_frame(), None);

    player.select_video("clip");
    assert_eq!(player.frame_count(), Some(3));
    let firsts: Vec<u8> = (0..4)
        .map(|_| player.consume_frame().unwrap().as_bytes()[0])
        .collect();
    assert_eq!(firsts, vec![0, 1, 2, 0]);
    assert_eq!(player.playing_frame(), Some(0));
}

#[test]
fn reselecting_same_track_keeps_position() {
    let layout = tiny();
    let mut lib = InMemoryVideoLibrary::new();
    lib.insert_track("a", numbered(&layout, 4));
    lib.insert_track("b", numbered(&layout, 2));

    let player = lib.player("p").unwrap();
    player.select_video("a");
    player.consume_frame();
    player.consume_frame();
    player.select_video("a");
    assert_eq!(player.consume_frame().unwrap().as_bytes()[0], 2);

    player.select_video("b");
    assert_eq!(player.playing_frame(), None);
    assert_eq!(player.consume_frame().unwrap().as_bytes()[0], 0);
}

#[test]
fn read_frame_has_no_side_effects() {
    let layout = tiny();
    let mut lib = InMemoryVideoLibrary::new();
    lib.insert_track("a", numbered(&layout, 3));
    let player = lib.player("p").unwrap();
    player.select_video("a");
    assert_eq!(player.read_frame(2).unwrap().as_bytes()[0], 2);
    assert_eq!(player.read_frame(3), None);
    assert_eq!(player.playing_frame(), None);
    assert_eq!(player.consume_frame().unwrap().as_bytes()[0], 0);
}

#[test]
fn players_are_independent() {
    let layout = tiny();
    let mut lib = InMemoryVideoLibrary::new();
    lib.insert_track("a", numbered(&layout, 3));
    {
        let p = lib.player("one").unwrap();
        p.select_video("a");
        p.consume_frame();
    }
    let p = lib.player("two").unwrap();
    p.select_video("a");
    assert_eq!(p.consume_frame().unwrap().as_bytes()[0], 0);
}

#[test]
fn raw_cache_splits_whole_frames() {
    let layout = tiny();
    let mut bytes: Vec<u8> = (0..12).collect();
    bytes.push(99);
    let frames = frames_from_raw(&bytes, &layout);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].as_bytes(), &[6, 7, 8, 9, 10, 11]);
}

#[test]
fn load_dir_picks_up_raw_files() {
    let layout = tiny();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("intro.raw"), [1u8; 18]).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let mut lib = InMemoryVideoLibrary::load_dir(dir.path(), &layout).unwrap();
    assert_eq!(lib.track_names().collect::<Vec<_>>(), vec!["intro"]);
    let p = lib.player("x").unwrap();
    p.select_video("intro");
    assert_eq!(p.frame_count(), Some(3));
}

#[test]
fn no_video_has_no_players() {
    assert!(NoVideo.player("anything").is_none());
}
