use embedded_hal::delay::DelayNs;
use linux_embedded_hal::{Delay, I2cdev};
use si1145::{Builder, Measurement, CONFIG_BIT_ALS, CONFIG_BIT_UV, DEFAULT_I2C_ADDRESS};

fn main() {
    let i2c = I2cdev::new("/dev/i2c-1").expect("I2C device");

    let mut sensor = Builder::new_i2c(i2c, DEFAULT_I2C_ADDRESS);

    //you need to implement an delay_source
    let mut delay_source = Delay {};

    sensor.reset(&mut delay_source).expect("error reset");
    sensor
        .init(CONFIG_BIT_ALS | CONFIG_BIT_UV)
        .expect("error init");

    sensor
        .measurement_force(Measurement::Als)
        .expect("error force");
    //give the forced conversion a moment to finish
    delay_source.delay_ms(10);

    let vis = sensor.get_vis_data().unwrap();
    let ir = sensor.get_ir_data().unwrap();
    let uv = sensor.get_uv_data().unwrap();
    println!("Visible: {}", vis);
    println!("Infrared: {}", ir);
    println!("UV index: {}", (uv as f32) / 100.0);
}
