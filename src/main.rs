use allegro_shim::logging::setup_logger;
use allegro_shim::*;
use log::{error, info};

fn draw_scene(frame: u32) {
    al_clear_to_color(al_map_rgb(30, 30, 40));

    let shade = (frame * 8 % 256) as u8;
    al_draw_filled_rectangle(40.0, 40.0, 200.0, 140.0, al_map_rgb(200, 60, shade));
    al_draw_rectangle(36.0, 36.0, 204.0, 144.0, al_map_rgb(255, 255, 255), 1.0);
    al_draw_filled_circle(320.0, 90.0, 50.0, al_map_rgb(60, 180, 90));
    al_draw_circle(320.0, 90.0, 58.0, al_map_rgb(255, 255, 255), 1.0);
    al_draw_filled_triangle(80.0, 380.0, 200.0, 200.0, 320.0, 380.0, al_map_rgba(70, 110, 220, 200));
    al_draw_arc(480.0, 300.0, 70.0, 0.0, 4.0, al_map_rgb(240, 200, 40), 1.0);
    for i in 0..16 {
        let x = 400.0 + i as f32 * 12.0;
        al_draw_line(x, 40.0, x + 40.0, 160.0, al_map_rgb(255, (i * 16) as u8, 0), 1.0);
    }

    al_flip_display();
}

fn main() {
    if let Err(err) = setup_logger(log::LevelFilter::Info) {
        eprintln!("Could not set up logging: {}", err);
    }

    if !al_init() {
        error!("Could not initialize");
        std::process::exit(1);
    }
    al_install_keyboard();
    al_init_primitives_addon();

    al_set_new_window_title("shimdemo");
    al_set_new_display_flags(ALLEGRO_WINDOWED | ALLEGRO_RESIZABLE);
    if al_create_display(640, 480).is_none() {
        error!("Could not create a display");
        std::process::exit(1);
    }

    let mut queue = al_create_event_queue();
    let mut event = Event::default();
    let mut frame = 0;
    draw_scene(frame);

    'running: loop {
        al_wait_for_event(&mut queue, &mut event);
        // Event type values overlap between categories; the payload tells them apart.
        match (event.payload, event.event_type) {
            (EventPayload::Display(_), ALLEGRO_EVENT_DISPLAY_CLOSE) => break 'running,
            (EventPayload::Display(_), ALLEGRO_EVENT_DISPLAY_RESIZE) => {
                al_acknowledge_resize(al_get_current_display());
            }
            (EventPayload::Keyboard(key), ALLEGRO_EVENT_KEY_DOWN) => {
                if key.keycode == ALLEGRO_KEY_ESCAPE {
                    break 'running;
                }
                frame += 1;
            }
            _ => continue,
        }
        draw_scene(frame);
    }

    info!("Exiting after {} redraws", frame);
    al_destroy_event_queue(queue);
    al_uninstall_system();
}
