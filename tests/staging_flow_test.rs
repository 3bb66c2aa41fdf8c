use std::time::Duration;

use cgmath::{InnerSpace, vec3};
use vitrine::{
    scroll::{PAGE_LENGTH, ScrollFeed, Spin},
    staging::{self, CENTRE_STAGE, CORNER_ORIGIN, Staging},
};

#[test]
fn wheel_deltas_accumulate_into_a_page_offset() {
    let mut scroll = ScrollFeed::new();
    scroll.apply_wheel(300.0);
    scroll.apply_wheel(300.0);
    scroll.apply_wheel(300.0);
    assert_eq!(scroll.offset(), 900.0);
    scroll.reset();
    assert_eq!(scroll.offset(), 0.0);
}

#[test]
fn frame_sized_steps_arrive_at_the_same_targets() {
    let mut staging = Staging::new();
    let start = [
        vec3(0.0, 0.0, 0.0),
        vec3(-22.0, 0.0, 0.0),
        vec3(22.0, 0.0, 0.0),
    ];
    staging.focus(1, &start);

    // a 60fps frame
    let dt = Duration::from_nanos(16_666_667);
    let mut current = start.to_vec();
    let mut steps = 0;
    loop {
        let moved = staging.advance(dt);
        if moved.is_empty() {
            break;
        }
        for (slot, position) in moved {
            current[slot] = position;
        }
        steps += 1;
        assert!(steps < 1_000, "the glide never settled");
    }

    // four seconds of frames
    assert_eq!(steps, 240);
    assert!((current[1] - CENTRE_STAGE).magnitude() < 1e-3);
    assert!((current[0] - CORNER_ORIGIN).magnitude() < 1e-3);
    assert!((current[2] - (CORNER_ORIGIN + vec3(30.0, 0.0, 0.0))).magnitude() < 1e-3);
}

#[test]
fn a_wheel_burst_spins_the_piece_until_it_rests() {
    let mut spin = Spin::new();
    // a 300px scroll sample
    spin.set(300.0 / 1000.0);

    let mut turned = 0.0;
    let mut frames = 0;
    while spin.velocity() != 0.0 {
        turned += spin.velocity();
        spin.decay();
        frames += 1;
        assert!(frames < 10_000, "spin never came to rest");
    }

    // the geometric series converges just below 0.3 / (1 - 0.99)
    assert!(frames > 1_000);
    assert!(turned > 29.0);
    assert!(turned < 30.0);
}

#[test]
fn deep_scroll_slides_the_staged_piece_out() {
    let mut scroll = ScrollFeed::new();
    scroll.apply_wheel(4000.0);
    assert_eq!(staging::slide_offset(scroll.offset()), Some(0.0));
    scroll.apply_wheel(400.0);
    assert_eq!(staging::slide_offset(scroll.offset()), Some(-7.5));
    scroll.apply_wheel(400.0);
    assert_eq!(staging::slide_offset(scroll.offset()), Some(-15.0));
    scroll.apply_wheel(400.0);
    assert_eq!(staging::slide_offset(scroll.offset()), None);

    // pinned to the end of the page, still outside the band
    scroll.apply_wheel(PAGE_LENGTH);
    assert_eq!(scroll.offset(), PAGE_LENGTH);
    assert_eq!(staging::slide_offset(scroll.offset()), None);
}
