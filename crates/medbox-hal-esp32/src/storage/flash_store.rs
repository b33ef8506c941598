use embedded_storage::{ReadStorage, Storage};
use esp_bootloader_esp_idf::partitions::{
    DataPartitionSubType, PARTITION_TABLE_MAX_LEN, PartitionType, read_partition_table,
};
use esp_rom_sys::rom::spiflash::{
    ESP_ROM_SPIFLASH_RESULT_OK, esp_rom_spiflash_erase_sector, esp_rom_spiflash_read,
    esp_rom_spiflash_unlock, esp_rom_spiflash_write,
};
use log::info;
use medbox_core::{
    alarm::AlarmConfig,
    storage::{DeviceStore, UserId, WifiCredentials},
};

const FLASH_SECTOR_SIZE: u32 = 4096;
const DEFAULT_FLASH_CAPACITY_BYTES: usize = 4 * 1024 * 1024;

const RECORD_MAGIC: u32 = 0x3158_424D; // "MBX1"
const RECORD_VERSION: u8 = 1;
const RECORD_HEADER_LEN: usize = 8;
const RECORD_PAYLOAD_MAX: usize = 160;
const RECORD_MAX_LEN: usize = RECORD_HEADER_LEN + RECORD_PAYLOAD_MAX + 4;
const RECORD_SECTORS: u32 = 3;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FlashStoreError {
    PartitionTable,
    StorePartitionMissing,
    PartitionTooSmall,
    FlashOpFailed(i32),
    Corrupted,
    RecordTooLarge,
    Encode,
    Unsupported,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
enum RecordKind {
    Wifi = 1,
    Alarm = 2,
    User = 3,
}

impl RecordKind {
    /// Sector index counted back from the end of the partition.
    const fn slot(self) -> u32 {
        match self {
            Self::Wifi => 3,
            Self::Alarm => 2,
            Self::User => 1,
        }
    }
}

#[derive(Debug)]
struct RawFlash;

impl RawFlash {
    fn new() -> Result<Self, FlashStoreError> {
        let rc = unsafe { esp_rom_spiflash_unlock() };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashStoreError::FlashOpFailed(rc));
        }
        Ok(Self)
    }

    fn erase_sector(&mut self, sector_addr: u32) -> Result<(), FlashStoreError> {
        if !sector_addr.is_multiple_of(FLASH_SECTOR_SIZE) {
            return Err(FlashStoreError::Unsupported);
        }

        let rc = unsafe { esp_rom_spiflash_erase_sector(sector_addr / FLASH_SECTOR_SIZE) };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashStoreError::FlashOpFailed(rc));
        }
        Ok(())
    }

    fn read_word(&mut self, addr: u32) -> Result<u32, FlashStoreError> {
        if !addr.is_multiple_of(4) {
            return Err(FlashStoreError::Unsupported);
        }

        let mut word = 0u32;
        let rc = unsafe { esp_rom_spiflash_read(addr, &mut word as *mut u32 as *const u32, 4) };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashStoreError::FlashOpFailed(rc));
        }
        Ok(word)
    }

    fn write_word(&mut self, addr: u32, word: u32) -> Result<(), FlashStoreError> {
        if !addr.is_multiple_of(4) {
            return Err(FlashStoreError::Unsupported);
        }

        let rc = unsafe { esp_rom_spiflash_write(addr, &word as *const u32, 4) };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashStoreError::FlashOpFailed(rc));
        }
        Ok(())
    }

    fn read_bytes(&mut self, addr: u32, out: &mut [u8]) -> Result<(), FlashStoreError> {
        let mut cursor = addr;
        let mut filled = 0usize;
        while filled < out.len() {
            let word_addr = cursor & !0b11;
            let skip = (cursor - word_addr) as usize;
            let word = self.read_word(word_addr)?.to_le_bytes();
            let take = (4 - skip).min(out.len() - filled);
            out[filled..filled + take].copy_from_slice(&word[skip..skip + take]);
            filled += take;
            cursor += take as u32;
        }
        Ok(())
    }

    /// Sector-aligned writes into freshly erased flash.
    fn write_erased_bytes(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashStoreError> {
        if !addr.is_multiple_of(4) {
            return Err(FlashStoreError::Unsupported);
        }

        for (index, chunk) in data.chunks(4).enumerate() {
            let mut bytes = [0xFFu8; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            self.write_word(addr + (index as u32) * 4, u32::from_le_bytes(bytes))?;
        }
        Ok(())
    }
}

impl ReadStorage for RawFlash {
    type Error = FlashStoreError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.read_bytes(offset, bytes)
    }

    fn capacity(&self) -> usize {
        DEFAULT_FLASH_CAPACITY_BYTES
    }
}

impl Storage for RawFlash {
    fn write(&mut self, _offset: u32, _bytes: &[u8]) -> Result<(), Self::Error> {
        Err(FlashStoreError::Unsupported)
    }
}

/// Wi-Fi, alarm and user records, one flash sector each, at the tail of the
/// first writable data partition.
#[derive(Debug)]
pub struct FlashStore {
    flash: RawFlash,
    partition_end: u32,
}

impl FlashStore {
    pub fn new() -> Result<Self, FlashStoreError> {
        let mut flash = RawFlash::new()?;

        let mut table_buf = [0u8; PARTITION_TABLE_MAX_LEN];
        let table = read_partition_table(&mut flash, &mut table_buf)
            .map_err(|_| FlashStoreError::PartitionTable)?;

        let mut best_data_undefined: Option<(u32, u32)> = None;
        let mut fallback_nvs: Option<(u32, u32)> = None;

        for entry in table.iter() {
            if entry.is_read_only() {
                continue;
            }

            match entry.partition_type() {
                PartitionType::Data(DataPartitionSubType::Undefined) => {
                    best_data_undefined = Some((entry.offset(), entry.len()));
                    break;
                }
                PartitionType::Data(DataPartitionSubType::Nvs) => {
                    if fallback_nvs.is_none() {
                        fallback_nvs = Some((entry.offset(), entry.len()));
                    }
                }
                _ => {}
            }
        }

        let (offset, len) = best_data_undefined
            .or(fallback_nvs)
            .ok_or(FlashStoreError::StorePartitionMissing)?;

        if len < RECORD_SECTORS * FLASH_SECTOR_SIZE {
            return Err(FlashStoreError::PartitionTooSmall);
        }

        info!("storage: flash records at offset={offset:#x} len={len}");
        Ok(Self {
            flash,
            partition_end: offset + len,
        })
    }

    fn sector_addr(&self, kind: RecordKind) -> u32 {
        self.partition_end - kind.slot() * FLASH_SECTOR_SIZE
    }

    /// Payload of a valid record into `out`; `None` for an erased or foreign
    /// sector.
    fn read_record<'b>(
        &mut self,
        kind: RecordKind,
        out: &'b mut [u8; RECORD_MAX_LEN],
    ) -> Result<Option<&'b [u8]>, FlashStoreError> {
        let addr = self.sector_addr(kind);
        self.flash.read_bytes(addr, out)?;

        if out[..RECORD_HEADER_LEN].iter().all(|b| *b == 0xFF) {
            return Ok(None);
        }

        let magic = u32::from_le_bytes([out[0], out[1], out[2], out[3]]);
        if magic != RECORD_MAGIC || out[4] != kind as u8 || out[5] != RECORD_VERSION {
            return Ok(None);
        }

        let len = u16::from_le_bytes([out[6], out[7]]) as usize;
        if len > RECORD_PAYLOAD_MAX {
            return Err(FlashStoreError::Corrupted);
        }

        let body_end = RECORD_HEADER_LEN + len;
        let expected = u32::from_le_bytes([
            out[body_end],
            out[body_end + 1],
            out[body_end + 2],
            out[body_end + 3],
        ]);
        if checksum32(&out[..body_end]) != expected {
            return Err(FlashStoreError::Corrupted);
        }

        Ok(Some(&out[RECORD_HEADER_LEN..body_end]))
    }

    fn write_record(&mut self, kind: RecordKind, payload: &[u8]) -> Result<(), FlashStoreError> {
        if payload.len() > RECORD_PAYLOAD_MAX {
            return Err(FlashStoreError::RecordTooLarge);
        }

        let mut buf = [0xFFu8; RECORD_MAX_LEN];
        buf[0..4].copy_from_slice(&RECORD_MAGIC.to_le_bytes());
        buf[4] = kind as u8;
        buf[5] = RECORD_VERSION;
        buf[6..8].copy_from_slice(&(payload.len() as u16).to_le_bytes());

        let body_end = RECORD_HEADER_LEN + payload.len();
        buf[RECORD_HEADER_LEN..body_end].copy_from_slice(payload);
        let checksum = checksum32(&buf[..body_end]);
        buf[body_end..body_end + 4].copy_from_slice(&checksum.to_le_bytes());

        let addr = self.sector_addr(kind);
        self.flash.erase_sector(addr)?;
        self.flash.write_erased_bytes(addr, &buf[..body_end + 4])
    }
}

impl DeviceStore for FlashStore {
    type Error = FlashStoreError;

    fn load_wifi_credentials(&mut self) -> Result<Option<WifiCredentials>, Self::Error> {
        let mut buf = [0u8; RECORD_MAX_LEN];
        let Some(payload) = self.read_record(RecordKind::Wifi, &mut buf)? else {
            return Ok(None);
        };

        let (ssid, rest) = take_field(payload)?;
        let (password, _) = take_field(rest)?;
        WifiCredentials::new(ssid, password)
            .map(Some)
            .ok_or(FlashStoreError::Corrupted)
    }

    fn save_wifi_credentials(&mut self, credentials: &WifiCredentials) -> Result<(), Self::Error> {
        let mut payload = [0u8; RECORD_PAYLOAD_MAX];
        let mut len = put_field(&mut payload, 0, credentials.ssid.as_bytes())?;
        len = put_field(&mut payload, len, credentials.password.as_bytes())?;
        self.write_record(RecordKind::Wifi, &payload[..len])
    }

    fn load_alarm_config(&mut self) -> Result<Option<AlarmConfig>, Self::Error> {
        let mut buf = [0u8; RECORD_MAX_LEN];
        let Some(payload) = self.read_record(RecordKind::Alarm, &mut buf)? else {
            return Ok(None);
        };

        serde_json::from_slice(payload)
            .map(Some)
            .map_err(|_| FlashStoreError::Corrupted)
    }

    fn save_alarm_config(&mut self, alarm: &AlarmConfig) -> Result<(), Self::Error> {
        let payload = serde_json::to_vec(alarm).map_err(|_| FlashStoreError::Encode)?;
        self.write_record(RecordKind::Alarm, &payload)
    }

    fn load_user_id(&mut self) -> Result<Option<UserId>, Self::Error> {
        let mut buf = [0u8; RECORD_MAX_LEN];
        let Some(payload) = self.read_record(RecordKind::User, &mut buf)? else {
            return Ok(None);
        };

        let text = core::str::from_utf8(payload).map_err(|_| FlashStoreError::Corrupted)?;
        UserId::try_from(text)
            .map(Some)
            .map_err(|_| FlashStoreError::Corrupted)
    }

    fn save_user_id(&mut self, user_id: &str) -> Result<(), Self::Error> {
        self.write_record(RecordKind::User, user_id.as_bytes())
    }
}

/// `[len u8][bytes]` field at the front of `payload`.
fn take_field(payload: &[u8]) -> Result<(&str, &[u8]), FlashStoreError> {
    let (&len, rest) = payload.split_first().ok_or(FlashStoreError::Corrupted)?;
    let len = len as usize;
    if rest.len() < len {
        return Err(FlashStoreError::Corrupted);
    }
    let (field, rest) = rest.split_at(len);
    let field = core::str::from_utf8(field).map_err(|_| FlashStoreError::Corrupted)?;
    Ok((field, rest))
}

fn put_field(out: &mut [u8], at: usize, field: &[u8]) -> Result<usize, FlashStoreError> {
    let end = at + 1 + field.len();
    if field.len() > u8::MAX as usize || end > out.len() {
        return Err(FlashStoreError::RecordTooLarge);
    }
    out[at] = field.len() as u8;
    out[at + 1..end].copy_from_slice(field);
    Ok(end)
}

fn checksum32(bytes: &[u8]) -> u32 {
    let mut hash = 0x811C9DC5u32;
    for b in bytes {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}
