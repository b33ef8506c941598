impl<IN> MedboxApp<IN>
where
    IN: InputProvider,
    IN::Error: Debug,
{
    pub fn new(input: IN, config: DeviceConfig, alarm: AlarmConfig) -> Self {
        Self {
            input,
            config,
            ui: UiState::ScanView,
            alarm,
            scheduler: AlarmScheduler::new(),
            outbox: Outbox::new(),
            networks: Vec::new(),
            network_cursor: 0,
            menu_cursor: 0,
            weekday_cursor: 0,
            char_cursor: 0,
            input_buffer: String::new(),
            join_request: None,
            bind_code: None,
            lid_latched: false,
            pending_redraw: true,
            local_time: None,
            last_clock_frame_ms: None,
            last_flash_ms: None,
            ring_flash_on: false,
        }
    }

    /// Advance one loop iteration: drain inputs, run the alarm scheduler
    /// and decide whether the screen must be redrawn.
    pub fn tick(&mut self, now_ms: u64, utc_secs: Option<i64>) -> TickResult {
        self.process_inputs();

        if let Some(utc_secs) = utc_secs {
            self.local_time = LocalTime::from_utc(utc_secs, self.config.utc_offset_secs);
        }

        match self.ui {
            UiState::ClockView => self.tick_clock(now_ms),
            UiState::AlarmRinging => self.tick_ringing(now_ms),
            UiState::ScanView
            | UiState::PasswordInput
            | UiState::MenuSelect
            | UiState::SetHour
            | UiState::SetMinute
            | UiState::SetWeekday
            | UiState::BindInput => self.take_redraw(),
        }
    }

    pub fn with_screen<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Screen<'_>) -> R,
    {
        match self.ui {
            UiState::ScanView => f(Screen::NetworkScan {
                label: self
                    .networks
                    .get(self.network_cursor as usize)
                    .map(|label| label.as_str()),
            }),
            UiState::PasswordInput => self.entry_screen(EntryFlow::WifiPassword, f),
            UiState::BindInput => self.entry_screen(EntryFlow::BindCode, f),
            UiState::ClockView => f(Screen::Clock {
                time: self.local_time.map(|now| ClockFace {
                    hour: now.hour,
                    minute: now.minute,
                    second: now.second,
                }),
                alarm: self
                    .alarm
                    .enabled()
                    .then_some((self.alarm.hour(), self.alarm.minute())),
                taken: self.scheduler.taken_today(),
            }),
            UiState::MenuSelect => f(Screen::Menu {
                items: &MenuItem::LABELS,
                cursor: self.menu_cursor as usize,
            }),
            UiState::SetHour => f(Screen::SetHour {
                hour: self.alarm.hour(),
            }),
            UiState::SetMinute => f(Screen::SetMinute {
                minute: self.alarm.minute(),
            }),
            UiState::SetWeekday => {
                let slot = if self.weekday_cursor < 7 {
                    WeekdaySlot::Day {
                        index: self.weekday_cursor,
                        enabled: self.alarm.day_enabled(self.weekday_cursor),
                    }
                } else {
                    WeekdaySlot::SaveAndExit
                };
                f(Screen::SetWeekday { slot })
            }
            UiState::AlarmRinging => f(Screen::Ringing {
                flash_on: self.ring_flash_on,
            }),
        }
    }

    fn entry_screen<F, R>(&self, flow: EntryFlow, f: F) -> R
    where
        F: FnOnce(Screen<'_>) -> R,
    {
        f(Screen::TextEntry {
            title: flow.title(),
            buffer: self.input_buffer.as_str(),
            carousel: flow.ring().window(self.char_cursor),
        })
    }

    pub fn state(&self) -> UiState {
        self.ui
    }

    /// Buzzer follows the ringing flash.
    pub fn buzzer_active(&self) -> bool {
        self.ui == UiState::AlarmRinging && self.ring_flash_on
    }

    pub fn alarm_config(&self) -> AlarmConfig {
        self.alarm
    }

    pub fn taken_today(&self) -> bool {
        self.scheduler.taken_today()
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn networks(&self) -> &[NetworkLabel] {
        &self.networks
    }

    pub fn input_mut(&mut self) -> &mut IN {
        &mut self.input
    }

    pub fn request_redraw(&mut self) {
        self.pending_redraw = true;
        self.last_clock_frame_ms = None;
    }
}
