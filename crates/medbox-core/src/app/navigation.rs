impl<IN> MedboxApp<IN>
where
    IN: InputProvider,
    IN::Error: Debug,
{
    fn set_state(&mut self, next: UiState) {
        if self.ui != next {
            debug!("ui: {:?} -> {:?}", self.ui, next);
        }
        self.ui = next;
        self.pending_redraw = true;
    }

    fn enter_menu(&mut self) {
        self.menu_cursor = 0;
        self.set_state(UiState::MenuSelect);
    }

    fn enter_entry(&mut self, flow: EntryFlow) {
        self.input_buffer.clear();
        self.char_cursor = 0;
        let next = match flow {
            EntryFlow::WifiPassword => UiState::PasswordInput,
            EntryFlow::BindCode => UiState::BindInput,
        };
        self.set_state(next);
    }

    pub fn enter_clock_view(&mut self) {
        self.set_state(UiState::ClockView);
        self.last_clock_frame_ms = None;
    }

    fn start_ringing(&mut self) {
        self.ring_flash_on = false;
        self.last_flash_ms = None;
        self.outbox.raise(Effect::NotifyAlarm);
        self.set_state(UiState::AlarmRinging);
    }
}
