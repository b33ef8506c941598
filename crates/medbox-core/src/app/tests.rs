use super::*;
use crate::{
    charset::{NUMERIC_CHARS, PASSWORD_CHARS},
    input::mock::MockInput,
    render::Screen,
};

// 2024-01-01 00:00:00 UTC, i.e. Monday 08:00:00 at the default UTC+8.
const MONDAY_0800_LOCAL: i64 = 1_704_067_200;

fn app() -> MedboxApp<MockInput> {
    MedboxApp::new(MockInput::new(), DeviceConfig::default(), AlarmConfig::default())
}

fn label(text: &str) -> NetworkLabel {
    NetworkLabel::try_from(text).unwrap()
}

fn send(app: &mut MedboxApp<MockInput>, events: &[InputEvent]) {
    app.input_mut().extend(events.iter().copied());
    app.tick(0, None);
}

fn type_text(app: &mut MedboxApp<MockInput>, charset: &str, text: &str) {
    for ch in text.chars() {
        let index = charset.find(ch).unwrap();
        let mut events = std::vec![InputEvent::RotateCw; index];
        events.push(InputEvent::Press);
        send(app, &events);
    }
}

fn select_ok(app: &mut MedboxApp<MockInput>) {
    send(
        app,
        &[
            InputEvent::RotateCcw,
            InputEvent::RotateCcw,
            InputEvent::RotateCcw,
            InputEvent::Press,
        ],
    );
}

fn monday_eight_alarm() -> AlarmConfig {
    let mut days = [false; 7];
    days[0] = true;
    AlarmConfig::new(8, 0, days, true).unwrap()
}

fn ringing_app() -> MedboxApp<MockInput> {
    let mut app = app();
    app.apply_alarm_config(monday_eight_alarm());
    app.enter_clock_view();
    app.tick(0, Some(MONDAY_0800_LOCAL - 1));
    app.tick(1_000, Some(MONDAY_0800_LOCAL));
    assert_eq!(app.state(), UiState::AlarmRinging);
    app
}

#[test]
fn wifi_password_flow_requests_join() {
    let mut app = app();
    app.set_networks([label("Office (-70dBm)"), label("Home (-50dBm)")]);
    send(&mut app, &[InputEvent::RotateCw, InputEvent::Press]);
    assert_eq!(app.state(), UiState::PasswordInput);

    type_text(&mut app, PASSWORD_CHARS, "abc123");
    assert_eq!(app.input_buffer(), "abc123");
    select_ok(&mut app);

    assert_eq!(app.pending_effect(), Some(Effect::JoinNetwork));
    let request = app.take_join_request().unwrap();
    assert_eq!(request.ssid.as_str(), "Home");
    assert_eq!(request.password.as_str(), "abc123");

    app.complete_effect(Effect::JoinNetwork);
    app.finish_join(true);
    assert_eq!(app.state(), UiState::ClockView);
    assert_eq!(app.pending_effect(), Some(Effect::SyncConfig));
}

#[test]
fn failed_join_returns_to_scan() {
    let mut app = app();
    app.set_networks([label("Home (-50dBm)")]);
    send(&mut app, &[InputEvent::Press]);
    select_ok(&mut app);
    app.finish_join(false);

    assert_eq!(app.state(), UiState::ScanView);
    assert_eq!(app.networks().len(), 1);
}

#[test]
fn scan_without_networks_ignores_input() {
    let mut app = app();
    send(&mut app, &[InputEvent::RotateCw, InputEvent::Press]);
    assert_eq!(app.state(), UiState::ScanView);
}

#[test]
fn delete_and_back_controls() {
    let mut app = app();
    app.set_networks([label("Home (-50dBm)")]);
    send(&mut app, &[InputEvent::Press]);
    type_text(&mut app, PASSWORD_CHARS, "xy");

    // Two steps back from the first character is DEL.
    send(
        &mut app,
        &[InputEvent::RotateCcw, InputEvent::RotateCcw, InputEvent::Press],
    );
    assert_eq!(app.input_buffer(), "x");

    // Cursor stays on DEL; one step forward is BACK.
    send(&mut app, &[InputEvent::RotateCw, InputEvent::Press]);
    assert_eq!(app.state(), UiState::ScanView);
    assert_eq!(app.pending_effect(), None);
}

#[test]
fn bind_flow_raises_bind_effect() {
    let mut app = app();
    app.enter_clock_view();
    send(&mut app, &[InputEvent::Press]);
    assert_eq!(app.state(), UiState::MenuSelect);

    send(&mut app, &[InputEvent::RotateCw; 3]);
    send(&mut app, &[InputEvent::Press]);
    assert_eq!(app.state(), UiState::BindInput);

    type_text(&mut app, NUMERIC_CHARS, "4821");
    select_ok(&mut app);

    assert_eq!(app.state(), UiState::ClockView);
    assert_eq!(app.pending_effect(), Some(Effect::BindCode));
    assert_eq!(app.take_bind_code().unwrap().as_str(), "4821");
}

#[test]
fn bind_back_returns_to_menu() {
    let mut app = app();
    app.enter_clock_view();
    send(&mut app, &[InputEvent::Press]);
    send(&mut app, &[InputEvent::RotateCw; 3]);
    send(&mut app, &[InputEvent::Press]);
    send(&mut app, &[InputEvent::RotateCcw, InputEvent::Press]);
    assert_eq!(app.state(), UiState::MenuSelect);
}

#[test]
fn set_time_wraps_and_enables_alarm() {
    let mut app = app();
    app.apply_alarm_config(AlarmConfig::new(0, 59, [false; 7], false).unwrap());
    app.enter_clock_view();
    send(&mut app, &[InputEvent::Press, InputEvent::Press]);
    assert_eq!(app.state(), UiState::SetHour);

    send(&mut app, &[InputEvent::RotateCcw, InputEvent::Press]);
    assert_eq!(app.state(), UiState::SetMinute);
    send(&mut app, &[InputEvent::RotateCw, InputEvent::Press]);

    let alarm = app.alarm_config();
    assert_eq!((alarm.hour(), alarm.minute()), (23, 0));
    assert!(alarm.enabled());
    assert_eq!(app.state(), UiState::ClockView);
    assert_eq!(app.pending_effect(), Some(Effect::SaveAlarm));
}

#[test]
fn weekday_editor_toggles_and_saves() {
    let mut app = app();
    app.enter_clock_view();
    send(&mut app, &[InputEvent::Press, InputEvent::RotateCw, InputEvent::Press]);
    assert_eq!(app.state(), UiState::SetWeekday);

    // Eight slots: a full turn lands back on Monday.
    send(&mut app, &[InputEvent::RotateCw; 8]);
    send(&mut app, &[InputEvent::RotateCw, InputEvent::Press]);
    assert!(app.alarm_config().day_enabled(1));
    assert_eq!(app.pending_effect(), None);

    send(&mut app, &[InputEvent::RotateCcw, InputEvent::RotateCcw]);
    app.with_screen(|screen| {
        assert_eq!(
            screen,
            Screen::SetWeekday {
                slot: WeekdaySlot::SaveAndExit
            }
        )
    });
    send(&mut app, &[InputEvent::Press]);
    assert_eq!(app.state(), UiState::ClockView);
    assert_eq!(app.pending_effect(), Some(Effect::SaveAlarm));
}

#[test]
fn log_now_marks_taken() {
    let mut app = app();
    app.enter_clock_view();
    send(&mut app, &[InputEvent::Press]);
    send(&mut app, &[InputEvent::RotateCcw; 2]);
    send(&mut app, &[InputEvent::Press]);

    assert_eq!(app.state(), UiState::ClockView);
    assert!(app.taken_today());
    assert_eq!(app.pending_effect(), Some(Effect::UploadLog));
}

#[test]
fn sync_cloud_raises_sync() {
    let mut app = app();
    app.enter_clock_view();
    send(&mut app, &[InputEvent::Press]);
    send(&mut app, &[InputEvent::RotateCw; 2]);
    send(&mut app, &[InputEvent::Press]);

    assert_eq!(app.state(), UiState::ClockView);
    assert_eq!(app.pending_effect(), Some(Effect::SyncConfig));
}

#[test]
fn alarm_rings_at_minute_and_press_acknowledges() {
    let mut app = ringing_app();
    assert_eq!(app.pending_effect(), Some(Effect::NotifyAlarm));
    assert!(app.buzzer_active());

    app.input_mut().push(InputEvent::Press);
    app.tick(1_100, Some(MONDAY_0800_LOCAL + 1));

    assert_eq!(app.state(), UiState::ClockView);
    assert!(app.taken_today());
    assert!(!app.buzzer_active());
    assert!(app.is_effect_pending(Effect::UploadLog));
}

#[test]
fn confirmed_lid_acknowledges_like_press() {
    let mut app = ringing_app();
    app.input_mut().push(InputEvent::LidOpened);
    app.tick(1_600, Some(MONDAY_0800_LOCAL + 1));

    assert_eq!(app.state(), UiState::ClockView);
    assert!(app.taken_today());
    assert!(!app.buzzer_active());
    assert!(app.is_effect_pending(Effect::UploadLog));
}

#[test]
fn repeated_lid_open_acknowledges_once() {
    let mut app = app();
    app.enter_clock_view();
    app.input_mut().push(InputEvent::LidOpened);
    app.tick(0, Some(MONDAY_0800_LOCAL));
    app.complete_effect(Effect::UploadLog);

    app.input_mut().push(InputEvent::LidOpened);
    app.tick(20, Some(MONDAY_0800_LOCAL));
    assert!(!app.is_effect_pending(Effect::UploadLog));

    app.input_mut()
        .extend([InputEvent::LidClosed, InputEvent::LidOpened]);
    app.tick(40, Some(MONDAY_0800_LOCAL));
    assert!(app.is_effect_pending(Effect::UploadLog));
}

#[test]
fn taken_alarm_does_not_ring_again_same_day() {
    let mut app = ringing_app();
    app.input_mut().push(InputEvent::Press);
    app.tick(1_100, Some(MONDAY_0800_LOCAL + 1));

    // Leave and re-enter the clock view inside the alarm minute.
    send(&mut app, &[InputEvent::Press]);
    send(&mut app, &[InputEvent::RotateCcw, InputEvent::Press]);
    app.tick(2_000, Some(MONDAY_0800_LOCAL + 30));
    assert_eq!(app.state(), UiState::ClockView);
}

#[test]
fn clock_redraws_on_one_second_cadence() {
    let mut app = app();
    app.enter_clock_view();
    assert_eq!(app.tick(0, None), TickResult::RenderRequested);
    assert_eq!(app.tick(500, None), TickResult::NoRender);
    assert_eq!(app.tick(999, None), TickResult::NoRender);
    assert_eq!(app.tick(1_000, None), TickResult::RenderRequested);
}

#[test]
fn ringing_flash_toggles_every_half_second() {
    let mut app = ringing_app();
    assert!(app.buzzer_active());
    assert_eq!(app.tick(1_200, None), TickResult::NoRender);
    assert_eq!(app.tick(1_500, None), TickResult::RenderRequested);
    assert!(!app.buzzer_active());
    app.with_screen(|screen| assert_eq!(screen, Screen::Ringing { flash_on: false }));
    assert_eq!(app.tick(2_000, None), TickResult::RenderRequested);
    assert!(app.buzzer_active());
}

#[test]
fn clock_screen_reflects_alarm() {
    let mut app = app();
    app.apply_alarm_config(monday_eight_alarm());
    app.enter_clock_view();
    app.tick(0, Some(MONDAY_0800_LOCAL - 3_600));

    app.with_screen(|screen| {
        assert_eq!(
            screen,
            Screen::Clock {
                time: Some(ClockFace {
                    hour: 7,
                    minute: 0,
                    second: 0
                }),
                alarm: Some((8, 0)),
                taken: false,
            }
        )
    });
}
