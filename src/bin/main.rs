#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_time::{Delay, Timer};
use esp_hal::{
    clock::CpuClock,
    gpio::{Input, InputConfig, Io, Level, Output, OutputConfig, Pull},
    i2c::master::{Config as I2cConfig, I2c},
    time::Rate,
    timer::timg::TimerGroup,
};
use log::{LevelFilter, info, warn};
use medbox_core::{
    alarm::AlarmConfig,
    app::{MedboxApp, TickResult},
    config::{DEFAULT_DEVICE_ID, DEFAULT_ENDPOINT, DeviceConfig, InputTiming},
    input::edges::{DebouncedInput, EdgeQueue},
    render,
    sync::orchestrator::Orchestrator,
};
use medbox_hal_esp32::{
    input::encoder::{self, PinLevels},
    network::{WifiStation, http::HttpTransport},
    platform::display::OledDisplay,
};
use static_cell::StaticCell;

use store::BoardStore;

#[path = "main/store.rs"]
mod store;

const I2C_FREQUENCY_KHZ: u32 = 400;
const LOOP_IDLE_MS: u64 = 20;
const NET_SEED: u64 = 0x6D65_6462_6F78_0001;

const API_URL: &str = match option_env!("MEDBOX_API_URL") {
    Some(url) => url,
    None => DEFAULT_ENDPOINT,
};
const DEVICE_ID: &str = match option_env!("MEDBOX_DEVICE_ID") {
    Some(id) => id,
    None => DEFAULT_DEVICE_ID,
};

static EDGE_QUEUE: StaticCell<EdgeQueue> = StaticCell::new();
static NET_RESOURCES: StaticCell<embassy_net::StackResources<4>> = StaticCell::new();

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

async fn halt(reason: &str) -> ! {
    warn!("boot: halted reason={reason}");
    loop {
        Timer::after_secs(1).await;
    }
}

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);
    esp_println::println!("boot: medbox starting");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // esp-radio requires an allocator.
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Panel: SCL=GPIO22, SDA=GPIO21
    let i2c_config = I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ));
    let i2c = match I2c::new(peripherals.I2C0, i2c_config) {
        Ok(i2c) => i2c
            .with_scl(peripherals.GPIO22)
            .with_sda(peripherals.GPIO21),
        Err(err) => {
            info!("i2c init failed: {:?}", err);
            halt("i2c").await
        }
    };
    let mut display = match OledDisplay::new(i2c) {
        Ok(display) => display,
        Err(err) => {
            info!("display init failed: {:?}", err);
            halt("display").await
        }
    };

    // Encoder: CLK=GPIO32, DT=GPIO33, SW=GPIO4. Lid switches: GPIO18, GPIO19.
    let input_cfg = InputConfig::default().with_pull(Pull::Up);
    let encoder_clk = Input::new(peripherals.GPIO32, input_cfg);
    let encoder_dt = Input::new(peripherals.GPIO33, input_cfg);
    let encoder_sw = Input::new(peripherals.GPIO4, input_cfg);
    let lid_a = Input::new(peripherals.GPIO18, input_cfg);
    let lid_b = Input::new(peripherals.GPIO19, input_cfg);
    let mut buzzer = Output::new(peripherals.GPIO15, Level::Low, OutputConfig::default());

    let (edge_producer, edge_consumer) = EDGE_QUEUE.init(EdgeQueue::new()).split();
    let mut io = Io::new(peripherals.IO_MUX);
    encoder::install(&mut io, encoder_clk, encoder_dt, encoder_sw, edge_producer);

    let input = DebouncedInput::new(
        edge_consumer,
        PinLevels::new(lid_a, lid_b),
        InputTiming::default(),
    );

    let device_config = DeviceConfig::default()
        .with_endpoint(API_URL)
        .with_device_id(DEVICE_ID);
    let mut app = MedboxApp::new(input, device_config, AlarmConfig::default());
    let mut store = BoardStore::open();

    let radio = match esp_radio::init() {
        Ok(radio) => radio,
        Err(err) => {
            info!("esp-radio init failed: {:?}", err);
            halt("radio").await
        }
    };

    let (wifi_controller, interfaces) =
        match esp_radio::wifi::new(&radio, peripherals.WIFI, esp_radio::wifi::Config::default()) {
            Ok(parts) => parts,
            Err(err) => {
                info!("wifi peripheral init failed: {:?}", err);
                halt("wifi").await
            }
        };

    let stack_config = embassy_net::Config::dhcpv4(Default::default());
    let (stack, mut net_runner) = embassy_net::new(
        interfaces.sta,
        stack_config,
        NET_RESOURCES.init(embassy_net::StackResources::<4>::new()),
        NET_SEED,
    );

    let mut orchestrator = Orchestrator::new(
        WifiStation::new(wifi_controller, stack),
        HttpTransport::new(stack),
        Delay,
        device_config,
    );

    info!(
        "medbox started: device_id={} endpoint={} utc_offset_secs={}",
        device_config.device_id, device_config.endpoint, device_config.utc_offset_secs
    );
    info!("Panel pins: SCL=GPIO22 SDA=GPIO21");
    info!("Encoder pins: CLK=GPIO32 DT=GPIO33 SW=GPIO4");
    info!("Lid pins: GPIO18 GPIO19; buzzer: GPIO15");

    let net_future = net_runner.run();
    let ui_future = async {
        orchestrator.boot(&mut app, &mut store, &mut display).await;

        loop {
            let dropped = encoder::take_dropped_edges();
            if dropped > 0 {
                warn!("input: edge queue full dropped={dropped}");
            }

            let now_ms = encoder::now_ms();
            if app.tick(now_ms, orchestrator.now_utc()) == TickResult::RenderRequested
                && let Err(err) = app.with_screen(|screen| render::draw(&screen, &mut display))
            {
                warn!("display: draw failed err={err:?}");
            }

            buzzer.set_level(if app.buzzer_active() {
                Level::High
            } else {
                Level::Low
            });

            orchestrator.drain(&mut app, &mut store, &mut display).await;
            Timer::after_millis(LOOP_IDLE_MS).await;
        }
    };

    let _ = embassy_futures::join::join(net_future, ui_future).await;
    unreachable!()
}
