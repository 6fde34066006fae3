pub mod i2c;

pub use self::i2c::I2cInterface;

/// A method of communicating with the sensor
pub trait SensorInterface {
    /// Interface error type
    type InterfaceError;

    /// Read a single register
    fn register_read(&mut self, reg: u8) -> Result<u8, Self::InterfaceError>;

    /// Write a single register
    fn register_write(&mut self, reg: u8, val: u8) -> Result<(), Self::InterfaceError>;

    /// Read a block of registers starting at `reg`,
    /// filling the whole buffer provided
    fn read_block(&mut self, reg: u8, recv_buf: &mut [u8]) -> Result<(), Self::InterfaceError>;
}
