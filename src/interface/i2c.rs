use embedded_hal as hal;

use super::SensorInterface;
use crate::Error;

pub struct I2cInterface<I2C> {
    /// i2c port
    i2c_port: I2C,
    /// address for i2c communications
    address: u8,
}

impl<I2C, CommE> I2cInterface<I2C>
where
    I2C: hal::i2c::I2c<Error = CommE>,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c_port: i2c,
            address,
        }
    }

    /// Release owned resources
    pub fn release(self) -> I2C {
        self.i2c_port
    }
}

impl<I2C, CommE> SensorInterface for I2cInterface<I2C>
where
    I2C: hal::i2c::I2c<Error = CommE>,
{
    type InterfaceError = Error<CommE>;

    fn register_read(&mut self, reg: u8) -> Result<u8, Self::InterfaceError> {
        let mut block: [u8; 1] = [0];
        self.i2c_port
            .write_read(self.address, &[reg], &mut block)
            .map_err(Error::Comm)?;
        Ok(block[0])
    }

    fn register_write(&mut self, reg: u8, val: u8) -> Result<(), Self::InterfaceError> {
        self.i2c_port
            .write(self.address, &[reg, val])
            .map_err(Error::Comm)?;
        Ok(())
    }

    fn read_block(&mut self, reg: u8, recv_buf: &mut [u8]) -> Result<(), Self::InterfaceError> {
        self.i2c_port
            .write_read(self.address, &[reg], recv_buf)
            .map_err(Error::Comm)?;
        Ok(())
    }
}
