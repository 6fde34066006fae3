/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

#![cfg_attr(not(test), no_std)]

use embedded_hal as hal;
use hal::delay::DelayNs;

#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

mod interface;
pub use interface::{I2cInterface, SensorInterface};

/// Errors in this crate
#[derive(Debug)]
pub enum Error<CommE> {
    /// Sensor communication error
    Comm(CommE),

    /// A register write did not read back as written
    RegisterVerify(Register),
    /// A parameter RAM write did not read back as written
    ParamVerify(Param),
    /// An identity register held an unrecognized value
    Identity(Register),
    /// The sensor reported an error status
    Status(Status),
}

pub struct Builder {}

impl Builder {
    /// Create a new driver using I2C interface
    pub fn new_i2c<I2C, CommE>(i2c: I2C, address: u8) -> Si1145<I2cInterface<I2C>>
    where
        I2C: hal::i2c::I2c<Error = CommE>,
        CommE: core::fmt::Debug,
    {
        let iface = interface::I2cInterface::new(i2c, address);
        Si1145::new_with_interface(iface)
    }
}

pub struct Si1145<SI> {
    pub(crate) si: SI,
}

impl<SI, CommE> Si1145<SI>
where
    SI: SensorInterface<InterfaceError = Error<CommE>>,
{
    pub(crate) fn new_with_interface(sensor_interface: SI) -> Self {
        Self {
            si: sensor_interface,
        }
    }

    /// Release the sensor interface
    pub fn release(self) -> SI {
        self.si
    }

    /// Initialize the sensor: confirm its identity, install the hardware
    /// key, then enable the measurement channels selected by `config`
    /// (a combination of the `CONFIG_BIT_*` flags).
    ///
    /// Initialization stops at the first failure and performs no rollback;
    /// after an error, retry from the beginning (or `reset` first).
    pub fn init(&mut self, config: u8) -> Result<(), SI::InterfaceError> {
        /// individual proximity channels
        const CHLIST_EN_PS1: u8 = 1 << 0;
        const CHLIST_EN_PS2: u8 = 1 << 1;
        const CHLIST_EN_PS3: u8 = 1 << 2;
        /// visible light channel
        const CHLIST_EN_ALS_VIS: u8 = 1 << 4;
        /// infrared light channel
        const CHLIST_EN_ALS_IR: u8 = 1 << 5;
        /// UV index channel
        const CHLIST_EN_UV: u8 = 1 << 7;

        /// high signal range (VIS_RANGE / IR_RANGE bit) for sunlight operation
        const ADC_MISC_RANGE_HIGH: u8 = 0x20;
        /// default UV index calibration coefficients
        const UCOEF_DEFAULT: [u8; 4] = [0x7B, 0x6B, 0x01, 0x00];

        self.check_register(Register::PartId, PART_ID)?;
        self.check_register(Register::RevId, REV_ID)?;
        self.check_register(Register::SeqId, SEQ_ID)?;

        // the sensor ignores commands until the hardware key is in place
        self.write_register(Register::HwKey, HW_KEY)?;

        let mut chlist = 0u8;
        if config & CONFIG_BIT_PS != 0 {
            chlist |= CHLIST_EN_PS1 | CHLIST_EN_PS2 | CHLIST_EN_PS3;
        }
        if config & CONFIG_BIT_ALS != 0 {
            chlist |= CHLIST_EN_ALS_VIS | CHLIST_EN_ALS_IR;
        }
        if config & CONFIG_BIT_UV != 0 {
            chlist |= CHLIST_EN_UV;

            // UV index needs the light ADCs in high range plus the
            // calibration coefficients
            self.write_param(Param::AlsVisAdcMisc, ADC_MISC_RANGE_HIGH)?;
            self.write_param(Param::AlsIrAdcMisc, ADC_MISC_RANGE_HIGH)?;
            self.write_register(Register::Ucoef0, UCOEF_DEFAULT[0])?;
            self.write_register(Register::Ucoef1, UCOEF_DEFAULT[1])?;
            self.write_register(Register::Ucoef2, UCOEF_DEFAULT[2])?;
            self.write_register(Register::Ucoef3, UCOEF_DEFAULT[3])?;
        }

        self.write_param(Param::Chlist, chlist)?;

        #[cfg(feature = "rttdebug")]
        rprintln!("chlist: 0x{:0x}  ", chlist);

        Ok(())
    }

    /// Reset the sensor and restore the hardware key.
    ///
    /// The command writes here are left unverified: the command register
    /// does not read back reliably while the sensor reboots.
    pub fn reset(&mut self, delay_source: &mut impl DelayNs) -> Result<(), SI::InterfaceError> {
        /// worst-case startup time after reset, in milliseconds
        const STARTUP_DELAY_MS: u32 = 30;

        self.si
            .register_write(Register::Command as u8, Command::Nop as u8)?;
        self.si
            .register_write(Register::Command as u8, Command::Reset as u8)?;
        delay_source.delay_ms(STARTUP_DELAY_MS);

        self.write_register(Register::HwKey, HW_KEY)
    }

    /// Set the interval for autonomous measurements. The sensor wakes
    /// every `rate` x 31.25 us while an auto measurement command is active.
    pub fn set_measurement_rate(&mut self, rate: u16) -> Result<(), SI::InterfaceError> {
        self.write_register(Register::MeasRate0, (rate & 0xFF) as u8)?;
        self.write_register(Register::MeasRate1, (rate >> 8) as u8)
    }

    /// Start autonomous measurement of the given quantity
    pub fn measurement_auto(&mut self, quantity: Measurement) -> Result<(), SI::InterfaceError> {
        let opcode = match quantity {
            Measurement::Ps => Command::PsAuto,
            Measurement::Als => Command::AlsAuto,
            Measurement::PsAls => Command::PsAlsAuto,
        };
        self.send_command(opcode, 0)?;
        self.check_status()
    }

    /// Pause autonomous measurement of the given quantity
    pub fn measurement_pause(&mut self, quantity: Measurement) -> Result<(), SI::InterfaceError> {
        let opcode = match quantity {
            Measurement::Ps => Command::PsPause,
            Measurement::Als => Command::AlsPause,
            Measurement::PsAls => Command::PsAlsPause,
        };
        self.send_command(opcode, 0)?;
        self.check_status()
    }

    /// Force a single measurement of the given quantity.
    /// An ADC overflow is reported as `Error::Status`; callers may treat
    /// that channel's reading as saturated rather than aborting.
    pub fn measurement_force(&mut self, quantity: Measurement) -> Result<(), SI::InterfaceError> {
        let opcode = match quantity {
            Measurement::Ps => Command::PsForce,
            Measurement::Als => Command::AlsForce,
            Measurement::PsAls => Command::PsAlsForce,
        };
        self.send_command(opcode, 0)?;
        self.check_status()
    }

    pub fn get_vis_data(&mut self) -> Result<u16, SI::InterfaceError> {
        self.read_data_u16(Register::AlsVisData0)
    }

    pub fn get_ir_data(&mut self) -> Result<u16, SI::InterfaceError> {
        self.read_data_u16(Register::AlsIrData0)
    }

    /// Raw UV index reading, scaled by 100 by the sensor
    pub fn get_uv_data(&mut self) -> Result<u16, SI::InterfaceError> {
        self.read_data_u16(Register::AuxData0)
    }

    /// Raw readings from the three proximity channels
    pub fn get_ps_data(&mut self) -> Result<[u16; 3], SI::InterfaceError> {
        let mut block: [u8; 6] = [0; 6];
        self.si.read_block(Register::Ps1Data0 as u8, &mut block)?;

        Ok([
            (block[1] as u16) << 8 | (block[0] as u16),
            (block[3] as u16) << 8 | (block[2] as u16),
            (block[5] as u16) << 8 | (block[4] as u16),
        ])
    }

    /// Read one byte of parameter RAM
    pub fn read_param(&mut self, param: Param) -> Result<u8, SI::InterfaceError> {
        self.send_command(Command::ParamGet, param as u8)?;
        self.check_status()?;
        self.read_register(Register::ParamRd)
    }

    /// Write one byte of parameter RAM and read it back to confirm.
    /// Bus-level verification only covers the staging register, not the
    /// RAM cell itself, hence the separate confirmation read.
    pub fn write_param(&mut self, param: Param, val: u8) -> Result<(), SI::InterfaceError> {
        self.write_register(Register::ParamWr, val)?;
        self.send_command(Command::ParamSet, param as u8)?;
        self.check_status()?;

        let confirm = self.read_param(param)?;
        if confirm != val {
            return Err(Error::ParamVerify(param));
        }
        Ok(())
    }

    fn read_register(&mut self, reg: Register) -> Result<u8, SI::InterfaceError> {
        self.si.register_read(reg as u8)
    }

    /// Write a register, then read it back to confirm the value stuck
    fn write_register(&mut self, reg: Register, val: u8) -> Result<(), SI::InterfaceError> {
        self.si.register_write(reg as u8, val)?;
        let confirm = self.si.register_read(reg as u8)?;
        if confirm != val {
            return Err(Error::RegisterVerify(reg));
        }
        Ok(())
    }

    /// Read a register and require a known value
    fn check_register(&mut self, reg: Register, expected: u8) -> Result<(), SI::InterfaceError> {
        let val = self.read_register(reg)?;
        if val != expected {
            #[cfg(feature = "rttdebug")]
            rprintln!("bogus identity reg 0x{:0x}: 0x{:0x}  ", reg as u8, val);
            return Err(Error::Identity(reg));
        }
        Ok(())
    }

    /// Send a command through the command register. The sensor only
    /// latches a command on a change of the register value, so every
    /// command is preceded by a NOP write to clear it.
    fn send_command(&mut self, opcode: Command, operand: u8) -> Result<(), SI::InterfaceError> {
        self.write_register(Register::Command, Command::Nop as u8)?;
        self.write_register(Register::Command, (opcode as u8) | operand)
    }

    /// Read the response register and decode any error status
    fn check_status(&mut self) -> Result<(), SI::InterfaceError> {
        let response = self.read_register(Register::Response)?;
        if let Some(status) = Status::from_response(response) {
            return Err(Error::Status(status));
        }
        Ok(())
    }

    /// Data registers are 16 bits wide, low byte first
    fn read_data_u16(&mut self, reg: Register) -> Result<u16, SI::InterfaceError> {
        let mut block: [u8; 2] = [0; 2];
        self.si.read_block(reg as u8, &mut block)?;

        Ok((block[1] as u16) << 8 | (block[0] as u16))
    }
}

/// The sensor's fixed I2C address
pub const DEFAULT_I2C_ADDRESS: u8 = 0x60;

/// Enable the three proximity channels
pub const CONFIG_BIT_PS: u8 = 1 << 0;
/// Enable the visible + infrared ambient light channels
pub const CONFIG_BIT_ALS: u8 = 1 << 1;
/// Enable the UV index channel
pub const CONFIG_BIT_UV: u8 = 1 << 2;

/// Identity register values for the supported part
const PART_ID: u8 = 0x45;
const REV_ID: u8 = 0x00;
const SEQ_ID: u8 = 0x08;

/// Magic value HW_KEY must hold for normal operation
const HW_KEY: u8 = 0x17;

/// Error values the sensor leaves in the response register
const RESPONSE_INVALID_COMMAND: u8 = 0x80;
const RESPONSE_PS1_OVERFLOW: u8 = 0x88;
const RESPONSE_PS2_OVERFLOW: u8 = 0x89;
const RESPONSE_PS3_OVERFLOW: u8 = 0x8A;
const RESPONSE_VIS_OVERFLOW: u8 = 0x8C;
const RESPONSE_IR_OVERFLOW: u8 = 0x8D;
const RESPONSE_AUX_OVERFLOW: u8 = 0x8E;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Directly addressable registers
pub enum Register {
    PartId = 0x00,
    RevId = 0x01,
    SeqId = 0x02,
    HwKey = 0x07,
    MeasRate0 = 0x08,
    MeasRate1 = 0x09,
    Ucoef0 = 0x13,
    Ucoef1 = 0x14,
    Ucoef2 = 0x15,
    Ucoef3 = 0x16,
    /// staging register for parameter RAM writes
    ParamWr = 0x17,
    Command = 0x18,
    Response = 0x20,
    AlsVisData0 = 0x22,
    AlsIrData0 = 0x24,
    Ps1Data0 = 0x26,
    Ps2Data0 = 0x28,
    Ps3Data0 = 0x2A,
    /// UV index data when the UV channel is enabled
    AuxData0 = 0x2C,
    /// readout register for parameter RAM reads
    ParamRd = 0x2E,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Parameter RAM cells, reachable only through PARAM_GET / PARAM_SET
pub enum Param {
    /// measurement channel enable bits
    Chlist = 0x01,
    /// visible light ADC configuration
    AlsVisAdcMisc = 0x12,
    /// infrared light ADC configuration
    AlsIrAdcMisc = 0x1F,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
/// Command opcodes
enum Command {
    Nop = 0x00,
    Reset = 0x01,
    PsForce = 0x05,
    AlsForce = 0x06,
    PsAlsForce = 0x07,
    PsPause = 0x09,
    AlsPause = 0x0A,
    PsAlsPause = 0x0B,
    PsAuto = 0x0D,
    AlsAuto = 0x0E,
    PsAlsAuto = 0x0F,
    /// read a parameter RAM cell, or'd with the RAM address
    ParamGet = 0x80,
    /// write a parameter RAM cell, or'd with the RAM address
    ParamSet = 0xA0,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Measurable quantities
pub enum Measurement {
    /// proximity, three channels
    Ps,
    /// ambient light, visible + infrared
    Als,
    /// proximity and ambient light together
    PsAls,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Error statuses the sensor reports through its response register
pub enum Status {
    /// the last command was not recognized
    InvalidCommand,
    /// proximity channel 1 ADC overflow
    Ps1Overflow,
    /// proximity channel 2 ADC overflow
    Ps2Overflow,
    /// proximity channel 3 ADC overflow
    Ps3Overflow,
    /// visible light ADC overflow
    VisOverflow,
    /// infrared light ADC overflow
    IrOverflow,
    /// auxiliary (UV) ADC overflow
    AuxOverflow,
    /// any other error response, with the raw register value
    Unknown(u8),
}

impl Status {
    /// Decode a response register value. `None` means no error: the
    /// sensor keeps the high nibble clear while commands succeed, and
    /// counts successful commands in the low nibble.
    pub fn from_response(response: u8) -> Option<Self> {
        if response & 0xF0 == 0 {
            return None;
        }

        let status = match response {
            RESPONSE_INVALID_COMMAND => Status::InvalidCommand,
            RESPONSE_PS1_OVERFLOW => Status::Ps1Overflow,
            RESPONSE_PS2_OVERFLOW => Status::Ps2Overflow,
            RESPONSE_PS3_OVERFLOW => Status::Ps3Overflow,
            RESPONSE_VIS_OVERFLOW => Status::VisOverflow,
            RESPONSE_IR_OVERFLOW => Status::IrOverflow,
            RESPONSE_AUX_OVERFLOW => Status::AuxOverflow,
            _ => Status::Unknown(response),
        };
        Some(status)
    }
}
