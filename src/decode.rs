//! Pulse width classification and frame reassembly.

use crate::pulse::PulseBuffer;

/// Buffer offsets of the first bit of each byte, after the lead-in pulse:
/// humidity high, humidity low, temperature high, temperature low, checksum.
const BYTE_OFFSETS: [usize; 5] = [0, 8, 16, 24, 32];

/// The five bytes of one DHT22 transmission, as received.
///
/// Values are stored even when the checksum does not match, so callers have
/// to check the error state before trusting them.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawFrame {
    /// Relative humidity ×10, big endian.
    pub humidity: [u8; 2],
    /// Temperature ×10, big endian. Bit 7 of the first byte is the sign.
    pub temperature: [u8; 2],
    /// Transmitted checksum.
    pub checksum: u8,
}

impl RawFrame {
    /// Classifies each data pulse against `logic_one` and assembles the bytes.
    ///
    /// A pulse wider than `logic_one` is a `1`. Bits are sent MSB first and
    /// the lead-in pulse at index 0 is skipped. Samples that were never
    /// written read as `0`.
    pub fn decode(pulses: &PulseBuffer, logic_one: u16) -> Self {
        let mut bytes = [0u8; 5];

        for (byte, offset) in bytes.iter_mut().zip(BYTE_OFFSETS) {
            for bit in 0..8 {
                *byte <<= 1;
                if pulses.get(1 + offset + bit).unwrap_or(0) > logic_one {
                    *byte |= 1;
                }
            }
        }

        let [hum_hi, hum_lo, temp_hi, temp_lo, checksum] = bytes;
        RawFrame {
            humidity: [hum_hi, hum_lo],
            temperature: [temp_hi, temp_lo],
            checksum,
        }
    }

    /// Sum of the four data bytes, truncated to 8 bits.
    pub fn expected_checksum(&self) -> u8 {
        let [hum_hi, hum_lo] = self.humidity;
        let [temp_hi, temp_lo] = self.temperature;
        hum_hi
            .wrapping_add(hum_lo)
            .wrapping_add(temp_hi)
            .wrapping_add(temp_lo)
    }

    /// True when the transmitted checksum matches the data bytes.
    pub fn is_valid(&self) -> bool {
        self.expected_checksum() == self.checksum
    }

    /// Relative humidity in percent.
    pub fn relative_humidity(&self) -> f32 {
        f32::from(u16::from_be_bytes(self.humidity)) / 10.0
    }

    /// Temperature magnitude in degrees Celsius, sign bit masked off.
    pub fn temperature(&self) -> f32 {
        let [temp_hi, temp_lo] = self.temperature;
        f32::from(u16::from_be_bytes([temp_hi & 0x7F, temp_lo])) / 10.0
    }

    /// True when the sensor flagged the temperature as negative.
    pub fn is_below_zero(&self) -> bool {
        self.temperature[0] & 0x80 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::FRAME_PULSES;

    const LOGIC_ONE: u16 = 25;
    const SHORT: u16 = 19;
    const LONG: u16 = 30;

    fn pulses_for(bytes: [u8; 5]) -> PulseBuffer {
        let mut pulses = PulseBuffer::new();
        // lead-in
        pulses.push(40);
        for byte in bytes {
            for i in 0..8 {
                let bit = (byte >> (7 - i)) & 1;
                pulses.push(if bit == 1 { LONG } else { SHORT });
            }
        }
        assert_eq!(pulses.len(), FRAME_PULSES);
        pulses
    }

    #[test]
    fn decodes_all_zero_frame() {
        let frame = RawFrame::decode(&pulses_for([0; 5]), LOGIC_ONE);

        assert_eq!(frame, RawFrame::default());
        assert!(frame.is_valid());
        assert_eq!(frame.temperature(), 0.0);
        assert_eq!(frame.relative_humidity(), 0.0);
    }

    #[test]
    fn decodes_humidity_and_temperature() {
        // 400 -> 40.0 %RH, 200 -> 20.0 C
        let checksum = 0x01u8.wrapping_add(0x90).wrapping_add(0x00).wrapping_add(0xC8);
        let frame = RawFrame::decode(&pulses_for([0x01, 0x90, 0x00, 0xC8, checksum]), LOGIC_ONE);

        assert_eq!(frame.humidity, [0x01, 0x90]);
        assert_eq!(frame.temperature, [0x00, 0xC8]);
        assert_eq!(frame.checksum, 0x59);
        assert!(frame.is_valid());
        assert_eq!(frame.relative_humidity(), 40.0);
        assert_eq!(frame.temperature(), 20.0);
    }

    #[test]
    fn checksum_mismatch_keeps_values() {
        let frame = RawFrame::decode(&pulses_for([0x01, 0x90, 0x00, 0xC8, 0x5A]), LOGIC_ONE);

        assert!(!frame.is_valid());
        assert_eq!(frame.expected_checksum(), 0x59);
        assert_eq!(frame.relative_humidity(), 40.0);
        assert_eq!(frame.temperature(), 20.0);
    }

    #[test]
    fn checksum_wraps_around() {
        // 0xFF + 0xFF + 0x02 + 0x03 = 0x203
        let frame = RawFrame::decode(&pulses_for([0xFF, 0xFF, 0x02, 0x03, 0x03]), LOGIC_ONE);
        assert!(frame.is_valid());
    }

    #[test]
    fn sign_bit_is_masked_off() {
        // -1.0 C is sent as 0x80 0x0A
        let frame = RawFrame::decode(&pulses_for([0x01, 0x90, 0x80, 0x0A, 0x1B]), LOGIC_ONE);

        assert!(frame.is_valid());
        assert!(frame.is_below_zero());
        assert_eq!(frame.temperature(), 1.0);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut pulses = PulseBuffer::new();
        pulses.push(0);
        pulses.push(LOGIC_ONE);
        pulses.push(LOGIC_ONE + 1);

        let frame = RawFrame::decode(&pulses, LOGIC_ONE);
        assert_eq!(frame.humidity[0], 0b0100_0000);
    }

    #[test]
    fn short_buffer_reads_missing_bits_as_zero() {
        let mut pulses = PulseBuffer::new();
        pulses.push(40);
        for _ in 0..8 {
            pulses.push(LONG);
        }

        let frame = RawFrame::decode(&pulses, LOGIC_ONE);
        assert_eq!(frame.humidity, [0xFF, 0x00]);
        assert_eq!(frame.checksum, 0);
        assert!(!frame.is_valid());
    }
}
