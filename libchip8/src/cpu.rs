use log::{debug, trace, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::config::{Config, Quirks};
use super::error::Fault;
use super::peripherals::{glyph_addr, Peripherals};

mod decoder;
mod registers;

use decoder::{
    ArithmeticLogic, Instruction, KeyCondition, Register, ShiftDirection, SkipCondition,
    TransferDirection,
};
pub(crate) use registers::{Registers, Stack, STACK_SIZE};

/// Where the `CXNN` stream stands: its key and how many words were drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RngState {
    pub seed: [u8; 32],
    pub word_pos: u128,
}

impl RngState {
    fn resume(self) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::from_seed(self.seed);
        rng.set_word_pos(self.word_pos);
        rng
    }
}

pub struct Cpu {
    registers: Registers,
    stack: Stack,
    quirks: Quirks,
    rng: ChaCha8Rng,
    fault: Option<Fault>,
    /// Set while `FX0A` is stalled on an empty key latch.
    waiting_for_key: bool,
}

impl Cpu {
    pub fn new(config: &Config) -> Self {
        let seed = config.rng_seed.unwrap_or_else(rand::random);
        let rng = ChaCha8Rng::seed_from_u64(seed);

        Self {
            registers: Registers::new(),
            stack: Stack::new(),
            quirks: config.quirks,
            rng,
            fault: None,
            waiting_for_key: false,
        }
    }

    pub(crate) fn registers(&self) -> &Registers {
        &self.registers
    }

    pub(crate) fn stack(&self) -> &Stack {
        &self.stack
    }

    pub(crate) fn fault(&self) -> Option<Fault> {
        self.fault
    }

    pub(crate) fn rng_state(&self) -> RngState {
        RngState {
            seed: self.rng.get_seed(),
            word_pos: self.rng.get_word_pos(),
        }
    }

    /// Replace the architectural state, including the position in the random
    /// stream, and resume running.
    pub(crate) fn restore(&mut self, registers: Registers, stack: Stack, rng: RngState) {
        self.registers = registers;
        self.stack = stack;
        self.rng = rng.resume();
        self.fault = None;
        self.waiting_for_key = false;
    }

    /// Execute one instruction.
    ///
    /// Once a fault has been raised the CPU is halted: nothing is executed
    /// and the same fault is returned again.
    pub(crate) fn step(&mut self, peripherals: &mut Peripherals) -> Result<(), Fault> {
        if let Some(fault) = self.fault {
            return Err(fault);
        }

        self.execute(peripherals).map_err(|fault| {
            warn!("halting: {fault}");
            self.fault = Some(fault);
            fault
        })
    }

    fn execute(&mut self, peripherals: &mut Peripherals) -> Result<(), Fault> {
        let addr = self.registers.pc;
        let opcode = peripherals.read_u16(addr);
        let mut pc = addr.wrapping_add(2);

        trace!("{addr:03x}: {opcode:04x}");

        match Instruction::decode(opcode) {
            Instruction::ClearScreen => peripherals.video.clear(),
            Instruction::Return => {
                pc = self
                    .stack
                    .pop()
                    .ok_or(Fault::StackUnderflow { addr })?;
            }
            Instruction::Jump(target) => pc = target,
            Instruction::Call(target) => {
                if !self.stack.push(pc) {
                    return Err(Fault::StackOverflow { addr });
                }
                pc = target;
            }
            Instruction::SkipImmediate(condition, x, value) => {
                if Self::check_condition(condition, self.registers.read(x), value) {
                    pc = pc.wrapping_add(2);
                }
            }
            Instruction::SkipRegister(condition, x, y) => {
                let (vx, vy) = (self.registers.read(x), self.registers.read(y));
                if Self::check_condition(condition, vx, vy) {
                    pc = pc.wrapping_add(2);
                }
            }
            Instruction::LoadImmediate(x, value) => self.registers.write(x, value),
            Instruction::AddImmediate(x, value) => {
                let sum = self.registers.read(x).wrapping_add(value);
                self.registers.write(x, sum);
            }
            Instruction::ArithmeticLogic(operation, x, y) => {
                let vx = self.registers.read(x);
                let vy = self.registers.read(y);

                let (val, flag) = match operation {
                    ArithmeticLogic::Load => (vy, None),
                    ArithmeticLogic::Or => (vx | vy, None),
                    ArithmeticLogic::And => (vx & vy, None),
                    ArithmeticLogic::Xor => (vx ^ vy, None),
                    ArithmeticLogic::Add => {
                        let (val, carry) = vx.overflowing_add(vy);
                        (val, Some(carry))
                    }
                    ArithmeticLogic::Sub => {
                        let (val, borrow) = vx.overflowing_sub(vy);
                        (val, Some(!borrow))
                    }
                    ArithmeticLogic::SubReverse => {
                        let (val, borrow) = vy.overflowing_sub(vx);
                        (val, Some(!borrow))
                    }
                };

                // The flag is written last so it wins when X is VF.
                self.registers.write(x, val);
                if let Some(flag) = flag {
                    self.registers.set_flag(flag);
                }
            }
            Instruction::Shift(direction, x, y) => {
                let source = if self.quirks.shift_uses_vy { y } else { x };
                let input = self.registers.read(source);

                let (val, shifted_out) = match direction {
                    ShiftDirection::Right => (input >> 1, input & 0b0000_0001),
                    ShiftDirection::Left => (input << 1, input >> 7),
                };

                self.registers.write(x, val);
                self.registers.write(Register::VF, shifted_out);
            }
            Instruction::LoadIndex(target) => self.registers.i = target,
            Instruction::JumpOffset(target) => {
                pc = target.wrapping_add(self.registers.read(Register::V0) as u16);
            }
            Instruction::Random(x, mask) => {
                let val: u8 = self.rng.gen();
                self.registers.write(x, val & mask);
            }
            Instruction::Draw(x, y, height) => {
                let (vx, vy) = (self.registers.read(x), self.registers.read(y));
                let collision = peripherals.draw_sprite(vx, vy, self.registers.i, height);
                self.registers.set_flag(collision);
            }
            Instruction::SkipKey(condition, x) => {
                let down = peripherals.keypad.is_down(self.registers.read(x));

                let skip = match condition {
                    KeyCondition::Pressed => down,
                    KeyCondition::NotPressed => !down,
                };

                if skip {
                    pc = pc.wrapping_add(2);
                }
            }
            Instruction::ReadDelay(x) => self.registers.write(x, peripherals.timers.delay()),
            Instruction::WaitKey(x) => match peripherals.keypad.first_down() {
                Some(key) => {
                    self.waiting_for_key = false;
                    self.registers.write(x, key);
                }
                // Stay on this instruction until a key shows up in the latch.
                None => {
                    if !self.waiting_for_key {
                        debug!("{addr:03x}: waiting for a key");
                        self.waiting_for_key = true;
                    }
                    pc = addr;
                }
            },
            Instruction::SetDelay(x) => peripherals.timers.set_delay(self.registers.read(x)),
            Instruction::SetSound(x) => peripherals.timers.set_sound(self.registers.read(x)),
            Instruction::AddIndex(x) => self.registers.add_to_index(self.registers.read(x)),
            Instruction::LoadGlyph(x) => self.registers.i = glyph_addr(self.registers.read(x)),
            Instruction::StoreBcd(x) => {
                let val = self.registers.read(x);
                let i = self.registers.i;

                peripherals.write(i, val / 100);
                peripherals.write(i.wrapping_add(1), val / 10 % 10);
                peripherals.write(i.wrapping_add(2), val % 10);
            }
            Instruction::Transfer(direction, x) => {
                let base = self.registers.i;

                for register in x.range_from_v0() {
                    let addr = base.wrapping_add(register.index() as u16);

                    match direction {
                        TransferDirection::ToMemory => {
                            peripherals.write(addr, self.registers.read(register));
                        }
                        TransferDirection::FromMemory => {
                            self.registers.write(register, peripherals.read(addr));
                        }
                    }
                }

                if self.quirks.load_store_advances_index {
                    self.registers.i = base.wrapping_add(x.index() as u16 + 1);
                }
            }
            Instruction::Invalid(opcode) => {
                return Err(Fault::InvalidOpcode { opcode, addr });
            }
        }

        self.registers.pc = pc;

        Ok(())
    }

    fn check_condition(condition: SkipCondition, a: u8, b: u8) -> bool {
        match condition {
            SkipCondition::Equal => a == b,
            SkipCondition::NotEqual => a != b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripherals::Video;

    struct Machine {
        cpu: Cpu,
        peripherals: Peripherals,
    }

    impl Machine {
        fn with_quirks(program: &[u16], quirks: Quirks) -> Self {
            let config = Config::default().with_quirks(quirks).with_rng_seed(7);
            let rom: Vec<u8> = program.iter().flat_map(|op| op.to_be_bytes()).collect();

            let mut peripherals = Peripherals::new();
            peripherals.memory.load(&rom).unwrap();

            Self {
                cpu: Cpu::new(&config),
                peripherals,
            }
        }

        fn new(program: &[u16]) -> Self {
            Self::with_quirks(program, Quirks::default())
        }

        fn step(&mut self) -> Result<(), Fault> {
            self.cpu.step(&mut self.peripherals)
        }

        fn run(&mut self, steps: usize) {
            for _ in 0..steps {
                self.step().unwrap();
            }
        }

        fn v(&self, n: usize) -> u8 {
            self.cpu.registers.v[n]
        }

        fn pc(&self) -> u16 {
            self.cpu.registers.pc
        }
    }

    #[test]
    fn load_and_add_immediate() {
        let mut m = Machine::new(&[0x6a12, 0x7a34, 0x7aff]);
        m.run(3);
        assert_eq!(m.v(0xa), 0x45);
        // 7XNN never touches the flag
        assert_eq!(m.v(0xf), 0);
        assert_eq!(m.pc(), 0x206);
    }

    #[test]
    fn jump_sets_pc() {
        let mut m = Machine::new(&[0x1345]);
        m.run(1);
        assert_eq!(m.pc(), 0x345);
    }

    #[test]
    fn jump_with_offset_adds_v0() {
        let mut m = Machine::new(&[0x6010, 0xb300]);
        m.run(2);
        assert_eq!(m.pc(), 0x310);
    }

    #[test]
    fn call_and_return() {
        // 200: call 206; 202: ld v1, 1; 204: jp 204; 206: ld v2, 2; 208: ret
        let mut m = Machine::new(&[0x2206, 0x6101, 0x1204, 0x6202, 0x00ee]);
        m.run(1);
        assert_eq!(m.pc(), 0x206);
        assert_eq!(m.cpu.stack.sp, 1);
        assert_eq!(m.cpu.stack.slots[0], 0x202);

        m.run(2);
        assert_eq!(m.pc(), 0x202);
        assert_eq!(m.cpu.stack.sp, 0);

        m.run(1);
        assert_eq!((m.v(1), m.v(2)), (1, 2));
    }

    #[test]
    fn skip_immediate() {
        let mut m = Machine::new(&[0x6105, 0x3105, 0x0000, 0x4106, 0x0000, 0x3107]);
        m.run(3);
        assert_eq!(m.pc(), 0x20a);
        m.run(1);
        assert_eq!(m.pc(), 0x20c);
    }

    #[test]
    fn skip_register() {
        let mut m = Machine::new(&[0x6103, 0x6203, 0x5120, 0x0000, 0x9120, 0x6303]);
        m.run(4);
        assert_eq!(m.pc(), 0x20a);
        assert_eq!(m.v(3), 0);
    }

    #[test]
    fn bitwise_operations() {
        let mut m = Machine::new(&[
            0x60f0, 0x610f, 0x6255, 0x8011, 0x63f0, 0x8312, 0x6433, 0x8423, 0x8520,
        ]);
        m.run(9);
        assert_eq!(m.v(0), 0xff);
        assert_eq!(m.v(3), 0x00);
        assert_eq!(m.v(4), 0x33 ^ 0x55);
        assert_eq!(m.v(5), 0x55);
    }

    #[test]
    fn add_sets_carry() {
        let mut m = Machine::new(&[0x60ff, 0x6102, 0x8014, 0x8014]);
        m.run(3);
        assert_eq!(m.v(0), 0x01);
        assert_eq!(m.v(0xf), 1);
        m.run(1);
        assert_eq!(m.v(0), 0x03);
        assert_eq!(m.v(0xf), 0);
    }

    #[test]
    fn sub_sets_not_borrow() {
        let mut m = Machine::new(&[0x6005, 0x6103, 0x8015, 0x8015]);
        m.run(3);
        assert_eq!(m.v(0), 2);
        assert_eq!(m.v(0xf), 1);
        m.run(1);
        assert_eq!(m.v(0), 0xff);
        assert_eq!(m.v(0xf), 0);
    }

    #[test]
    fn sub_of_equal_values_has_no_borrow() {
        let mut m = Machine::new(&[0x6007, 0x6107, 0x8015]);
        m.run(3);
        assert_eq!(m.v(0), 0);
        assert_eq!(m.v(0xf), 1);
    }

    #[test]
    fn reverse_sub() {
        let mut m = Machine::new(&[0x6003, 0x6105, 0x8017, 0x6205, 0x6303, 0x8237]);
        m.run(3);
        assert_eq!(m.v(0), 2);
        assert_eq!(m.v(0xf), 1);
        m.run(3);
        assert_eq!(m.v(2), 0xfe);
        assert_eq!(m.v(0xf), 0);
    }

    #[test]
    fn flag_wins_over_result_in_vf() {
        let mut m = Machine::new(&[0x6fff, 0x6101, 0x8f14]);
        m.run(3);
        assert_eq!(m.v(0xf), 1);
    }

    #[test]
    fn shift_in_place_by_default() {
        let mut m = Machine::new(&[0x6005, 0x61ff, 0x8016, 0x6281, 0x821e]);
        m.run(3);
        assert_eq!(m.v(0), 0x02);
        assert_eq!(m.v(0xf), 1);
        m.run(2);
        assert_eq!(m.v(2), 0x02);
        assert_eq!(m.v(0xf), 1);
    }

    #[test]
    fn shift_from_vy_quirk() {
        let quirks = Quirks {
            shift_uses_vy: true,
            ..Quirks::default()
        };
        let mut m = Machine::with_quirks(
            &[0x6005, 0x6140, 0x8016, 0x6201, 0x631f, 0x823e],
            quirks,
        );
        m.run(3);
        assert_eq!(m.v(0), 0x20);
        assert_eq!(m.v(1), 0x40);
        assert_eq!(m.v(0xf), 0);
        m.run(3);
        assert_eq!(m.v(2), 0x3e);
        assert_eq!(m.v(0xf), 0);
    }

    #[test]
    fn random_is_masked() {
        let mut m = Machine::new(&[0xc00f, 0xc100]);
        m.run(2);
        assert_eq!(m.v(0) & 0xf0, 0);
        assert_eq!(m.v(1), 0);
    }

    #[test]
    fn seeded_random_repeats() {
        let program = [0xc0ff, 0xc1ff, 0xc2ff];
        let mut a = Machine::new(&program);
        let mut b = Machine::new(&program);
        a.run(3);
        b.run(3);
        assert_eq!(a.cpu.registers.v, b.cpu.registers.v);
    }

    #[test]
    fn index_operations() {
        let mut m = Machine::new(&[0xa123, 0x6010, 0xf01e]);
        m.run(3);
        assert_eq!(m.cpu.registers.i, 0x133);
    }

    #[test]
    fn glyph_address() {
        let mut m = Machine::new(&[0x600b, 0xf029]);
        m.run(2);
        assert_eq!(m.cpu.registers.i, 55);
    }

    #[test]
    fn bcd_digits() {
        let mut m = Machine::new(&[0x60fe, 0xa300, 0xf033]);
        m.run(3);
        assert_eq!(m.peripherals.read(0x300), 2);
        assert_eq!(m.peripherals.read(0x301), 5);
        assert_eq!(m.peripherals.read(0x302), 4);
    }

    #[test]
    fn store_and_load_registers() {
        let mut m = Machine::new(&[0x6011, 0x6122, 0x6233, 0xa300, 0xf155, 0xa301, 0xf265]);
        m.run(5);
        assert_eq!(m.peripherals.read(0x300), 0x11);
        assert_eq!(m.peripherals.read(0x301), 0x22);
        // V2 not included
        assert_eq!(m.peripherals.read(0x302), 0x00);
        assert_eq!(m.cpu.registers.i, 0x300);

        m.run(2);
        assert_eq!((m.v(0), m.v(1), m.v(2)), (0x22, 0x00, 0x00));
        assert_eq!(m.cpu.registers.i, 0x301);
    }

    #[test]
    fn store_and_load_advance_index_quirk() {
        let quirks = Quirks {
            load_store_advances_index: true,
            ..Quirks::default()
        };
        let mut m = Machine::with_quirks(&[0xa300, 0xf255, 0xf065], quirks);
        m.run(2);
        assert_eq!(m.cpu.registers.i, 0x303);
        m.run(1);
        assert_eq!(m.cpu.registers.i, 0x304);
    }

    #[test]
    fn draw_font_glyph_and_collide() {
        let mut m = Machine::new(&[0x6000, 0xf029, 0xd005, 0xd005]);
        m.run(3);
        assert_eq!(m.v(0xf), 0);
        // "0" glyph top row
        assert!(m.peripherals.video.is_lit(0, 0));
        assert!(m.peripherals.video.is_lit(3, 0));
        assert!(!m.peripherals.video.is_lit(1, 1));

        m.run(1);
        assert_eq!(m.v(0xf), 1);
        assert_eq!(m.peripherals.video, Video::new());
    }

    #[test]
    fn clear_screen() {
        let mut m = Machine::new(&[0xd005, 0x00e0]);
        m.run(2);
        assert!(m.peripherals.video.frame().as_ref().iter().all(|px| *px == 0));
    }

    #[test]
    fn timers_from_registers() {
        let mut m = Machine::new(&[0x6009, 0xf015, 0xf018, 0xf107]);
        m.run(3);
        assert_eq!(m.peripherals.timers.delay(), 9);
        assert!(m.peripherals.timers.is_sound_active());

        m.peripherals.timers.tick();
        m.run(1);
        assert_eq!(m.v(1), 8);
    }

    #[test]
    fn skip_on_key_state() {
        let mut m = Machine::new(&[0x6007, 0xe09e, 0x6101, 0xe0a1, 0x6201]);
        let mut keys = [false; 16];
        keys[7] = true;
        m.peripherals.keypad.set_keys(&keys).unwrap();

        m.run(2);
        assert_eq!(m.pc(), 0x206);
        m.run(2);
        assert_eq!((m.v(1), m.v(2)), (0, 1));
    }

    #[test]
    fn skip_on_out_of_range_key_treats_it_as_up() {
        let mut m = Machine::new(&[0x6020, 0xe0a1]);
        m.peripherals.keypad.set_keys(&[true; 16]).unwrap();
        m.run(2);
        assert_eq!(m.pc(), 0x206);
    }

    #[test]
    fn wait_key_stalls_until_pressed() {
        let mut m = Machine::new(&[0xf30a, 0x6401]);
        m.run(5);
        assert_eq!(m.pc(), 0x200);
        assert_eq!(m.v(3), 0);

        let mut keys = [false; 16];
        keys[0xb] = true;
        m.peripherals.keypad.set_keys(&keys).unwrap();

        m.run(1);
        assert_eq!(m.v(3), 0xb);
        assert_eq!(m.pc(), 0x202);
    }

    #[test]
    fn key_wait_is_flagged_once_per_stall() {
        let mut m = Machine::new(&[0xf30a, 0x1200]);
        assert!(!m.cpu.waiting_for_key);

        m.run(1);
        assert!(m.cpu.waiting_for_key);
        m.run(3);
        assert!(m.cpu.waiting_for_key);

        let mut keys = [false; 16];
        keys[2] = true;
        m.peripherals.keypad.set_keys(&keys).unwrap();
        m.run(1);
        assert!(!m.cpu.waiting_for_key);

        // A second wait starts a new stall.
        m.peripherals.keypad.set_keys(&[false; 16]).unwrap();
        m.run(2);
        assert_eq!(m.pc(), 0x200);
        assert!(m.cpu.waiting_for_key);
    }

    #[test]
    fn invalid_opcode_halts_without_mutation() {
        let mut m = Machine::new(&[0x6042, 0x8008]);
        m.run(1);

        let fault = Fault::InvalidOpcode {
            opcode: 0x8008,
            addr: 0x202,
        };
        assert_eq!(m.step(), Err(fault));

        let registers = m.cpu.registers.clone();
        assert_eq!(m.step(), Err(fault));
        assert_eq!(m.step(), Err(fault));
        assert_eq!(m.cpu.registers, registers);
        assert_eq!(m.pc(), 0x202);
    }

    #[test]
    fn stack_overflow_on_seventeenth_call() {
        // 200: call 200, forever
        let mut m = Machine::new(&[0x2200]);
        m.run(16);
        assert_eq!(m.cpu.stack.sp, 16);

        let fault = Fault::StackOverflow { addr: 0x200 };
        assert_eq!(m.step(), Err(fault));

        let stack = m.cpu.stack.clone();
        assert_eq!(m.step(), Err(fault));
        assert_eq!(m.cpu.stack, stack);
    }

    #[test]
    fn stack_underflow_on_empty_return() {
        let mut m = Machine::new(&[0x00ee]);
        let fault = Fault::StackUnderflow { addr: 0x200 };
        assert_eq!(m.step(), Err(fault));
        assert_eq!(m.step(), Err(fault));
        assert_eq!(m.pc(), 0x200);
    }

    #[test]
    fn restore_clears_fault() {
        let mut m = Machine::new(&[0x00ee, 0x6001]);
        assert!(m.step().is_err());

        let mut registers = Registers::new();
        registers.pc = 0x202;
        let rng = m.cpu.rng_state();
        m.cpu.restore(registers, Stack::new(), rng);

        m.run(1);
        assert_eq!(m.v(0), 1);
    }

    #[test]
    fn restored_rng_continues_the_stream() {
        let program = [0xc0ff, 0xc1ff, 0xc2ff, 0xc3ff];
        let mut a = Machine::new(&program);
        a.run(2);

        let mut b = Machine::new(&[0x1200]);
        b.peripherals = a.peripherals.clone();
        b.cpu.restore(a.cpu.registers.clone(), a.cpu.stack.clone(), a.cpu.rng_state());
        assert_eq!(b.cpu.rng_state(), a.cpu.rng_state());

        a.run(2);
        b.run(2);
        assert_eq!(b.cpu.registers.v, a.cpu.registers.v);
    }
}
