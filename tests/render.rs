use std::sync::Arc;
use std::time::{Duration, Instant};

use cairo::{Context, ImageSurface};
use pagescriber::accel::{AccelerationBoundary, Accelerator, Capabilities};
use pagescriber::config::Action;
use pagescriber::draw::{FontDescriptor, ShapeType, StrokeStore};
use pagescriber::input::{InputState, Key, PointerEvent, Tool};
use pagescriber::pages::RenderedPage;
use pagescriber::render_loop::{FrameInput, RenderLoop, RenderSettings};
use pagescriber::util::ViewTransform;
use pagescriber::Config;

const WIDTH: i32 = 160;
const HEIGHT: i32 = 120;

fn blank_surface() -> ImageSurface {
    ImageSurface::create(cairo::Format::ARgb32, WIDTH, HEIGHT).unwrap()
}

fn render_loop() -> RenderLoop {
    let mut rl = RenderLoop::new(
        AccelerationBoundary::software(FontDescriptor::default()),
        RenderSettings::default(),
    );
    rl.resize(WIDTH, HEIGHT);
    rl
}

fn controller() -> InputState {
    InputState::from_config(&Config::default()).unwrap()
}

/// Reads one pixel as (r, g, b, a); exact for opaque pixels.
fn pixel(surface: &mut ImageSurface, x: i32, y: i32) -> (u8, u8, u8, u8) {
    surface.flush();
    let stride = surface.stride() as usize;
    let data = surface.data().unwrap();
    let offset = y as usize * stride + x as usize * 4;
    let value = u32::from_ne_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]);
    (
        ((value >> 16) & 0xff) as u8,
        ((value >> 8) & 0xff) as u8,
        (value & 0xff) as u8,
        (value >> 24) as u8,
    )
}

fn is_red(px: (u8, u8, u8, u8)) -> bool {
    px.0 > 200 && px.1 < 110 && px.2 < 110
}

fn is_white(px: (u8, u8, u8, u8)) -> bool {
    px.0 > 245 && px.1 > 245 && px.2 > 245
}

/// Runs one tick onto `surface`; the context is dropped before returning so
/// the pixels can be read back.
fn tick(
    rl: &mut RenderLoop,
    surface: &ImageSurface,
    store: &StrokeStore,
    input: &InputState,
    at: Instant,
    background: Option<&Arc<RenderedPage>>,
) -> bool {
    let ctx = Context::new(surface).unwrap();
    let overlays = input.overlays();
    rl.tick(
        at,
        &ctx,
        &FrameInput {
            store,
            page: input.page(),
            transform: input.transform,
            overlays: &overlays,
            background,
        },
    )
}

fn draw_line(input: &mut InputState, store: &mut StrokeStore, y: f64) {
    input.on_pointer_down(store, &PointerEvent::new(20.0, y));
    for x in (30..=120).step_by(10) {
        input.on_pointer_move(store, &PointerEvent::new(x as f64, y));
    }
    input.on_pointer_up(store, &PointerEvent::new(120.0, y));
}

#[test]
fn committed_pen_stroke_is_painted_and_undo_removes_it() {
    let mut surface = blank_surface();
    let mut rl = render_loop();
    let mut store = StrokeStore::new();
    let mut input = controller();
    let start = Instant::now();

    draw_line(&mut input, &mut store, 50.0);
    assert_eq!(store.strokes().len(), 1);
    assert!(tick(&mut rl, &surface, &store, &input, start, None));
    assert!(is_red(pixel(&mut surface, 70, 50)));
    assert!(is_white(pixel(&mut surface, 70, 90)));

    input.on_key_press(&mut store, Key::Ctrl);
    input.on_key_press(&mut store, Key::Char('z'));
    input.on_key_release(Key::Ctrl);
    assert!(store.strokes().is_empty());

    assert!(tick(
        &mut rl,
        &surface,
        &store,
        &input,
        start + Duration::from_millis(100),
        None
    ));
    assert!(is_white(pixel(&mut surface, 70, 50)));
}

#[test]
fn shape_preview_is_drawn_live_and_dropped_on_cancel() {
    let mut surface = blank_surface();
    let mut rl = render_loop();
    let mut store = StrokeStore::new();
    let mut input = controller();
    let start = Instant::now();

    input.handle_action(&mut store, Action::ToolRectangle);
    assert_eq!(input.tool(), Tool::Shape(ShapeType::Rectangle));
    input.on_pointer_down(&mut store, &PointerEvent::new(25.0, 25.0));
    input.on_pointer_move(&mut store, &PointerEvent::new(105.0, 85.0));

    assert!(tick(&mut rl, &surface, &store, &input, start, None));
    assert!(is_red(pixel(&mut surface, 70, 25)));
    assert!(store.strokes().is_empty());

    assert!(!input.overlays().is_empty());
    input.on_key_press(&mut store, Key::Escape);
    assert!(input.overlays().is_empty());
    assert!(tick(
        &mut rl,
        &surface,
        &store,
        &input,
        start + Duration::from_millis(100),
        None
    ));
    assert!(is_white(pixel(&mut surface, 70, 25)));
    assert!(store.strokes().is_empty());
}

#[test]
fn background_bitmap_sits_under_annotations() {
    let mut surface = blank_surface();
    let mut rl = render_loop();
    let mut store = StrokeStore::new();
    let mut input = controller();
    let page = Arc::new(RenderedPage {
        page_number: 1,
        width: WIDTH as f64,
        height: HEIGHT as f64,
        image: image::RgbaImage::from_pixel(80, 60, image::Rgba([0, 0, 255, 255])),
    });

    draw_line(&mut input, &mut store, 50.0);
    assert!(tick(&mut rl, &surface, &store, &input, Instant::now(), Some(&page)));

    let bg = pixel(&mut surface, 70, 90);
    assert!(bg.2 > 200 && bg.0 < 50, "background pixel {bg:?}");
    assert!(is_red(pixel(&mut surface, 70, 50)));
}

#[test]
fn panned_view_moves_strokes_on_screen() {
    let mut surface = blank_surface();
    let mut rl = render_loop();
    let mut store = StrokeStore::new();
    let mut input = controller();

    draw_line(&mut input, &mut store, 30.0);
    input.transform = ViewTransform {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 40.0,
    };
    assert!(tick(&mut rl, &surface, &store, &input, Instant::now(), None));

    assert!(is_red(pixel(&mut surface, 70, 70)));
    assert!(is_white(pixel(&mut surface, 70, 30)));
}

#[test]
fn accelerated_loop_matches_software_output() {
    let mut store = StrokeStore::new();
    let mut input = controller();
    draw_line(&mut input, &mut store, 50.0);
    input.handle_action(&mut store, Action::ToolCircle);
    input.on_pointer_down(&mut store, &PointerEvent::new(30.0, 60.0));
    input.on_pointer_up(&mut store, &PointerEvent::new(90.0, 110.0));
    assert_eq!(store.strokes().len(), 2);

    let mut soft_surface = blank_surface();
    let mut soft = render_loop();
    assert!(tick(&mut soft, &soft_surface, &store, &input, Instant::now(), None));

    let mut fast_surface = blank_surface();
    let mut fast = render_loop();
    assert!(fast.boundary_mut().install(Capabilities {
        max_surface_dimension: 8192,
        grid_cell_size: 64.0,
    }));
    assert_ne!(fast.boundary().name(), "software");
    assert!(tick(&mut fast, &fast_surface, &store, &input, Instant::now(), None));

    soft_surface.flush();
    fast_surface.flush();
    assert_eq!(
        soft_surface.data().unwrap().to_vec(),
        fast_surface.data().unwrap().to_vec()
    );
}
