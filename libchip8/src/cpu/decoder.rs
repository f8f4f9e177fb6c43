#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register(u8);

impl Register {
    pub const V0: Self = Self(0x0);
    pub const VF: Self = Self(0xf);

    fn from_nibble(nibble: u8) -> Self {
        Self(nibble & 0x0f)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// V0 up to and including `self`.
    pub fn range_from_v0(self) -> impl Iterator<Item = Register> {
        (0..=self.0).map(Register)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticLogic {
    Load,
    Or,
    And,
    Xor,
    Add,
    Sub,
    SubReverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipCondition {
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCondition {
    Pressed,
    NotPressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    ToMemory,
    FromMemory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1NNN
    Jump(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN, 4XNN
    SkipImmediate(SkipCondition, Register, u8),
    /// 5XY0, 9XY0
    SkipRegister(SkipCondition, Register, Register),
    /// 6XNN
    LoadImmediate(Register, u8),
    /// 7XNN, no carry flag
    AddImmediate(Register, u8),
    /// 8XY0 - 8XY7
    ArithmeticLogic(ArithmeticLogic, Register, Register),
    /// 8XY6, 8XYE
    Shift(ShiftDirection, Register, Register),
    /// ANNN
    LoadIndex(u16),
    /// BNNN
    JumpOffset(u16),
    /// CXNN
    Random(Register, u8),
    /// DXYN
    Draw(Register, Register, u8),
    /// EX9E, EXA1
    SkipKey(KeyCondition, Register),
    /// FX07
    ReadDelay(Register),
    /// FX0A
    WaitKey(Register),
    /// FX15
    SetDelay(Register),
    /// FX18
    SetSound(Register),
    /// FX1E
    AddIndex(Register),
    /// FX29
    LoadGlyph(Register),
    /// FX33
    StoreBcd(Register),
    /// FX55, FX65
    Transfer(TransferDirection, Register),
    Invalid(u16),
}

impl Instruction {
    pub fn decode(opcode: u16) -> Self {
        let nibbles = [
            (opcode >> 12) as u8 & 0x0f,
            (opcode >> 8) as u8 & 0x0f,
            (opcode >> 4) as u8 & 0x0f,
            opcode as u8 & 0x0f,
        ];

        let x = Register::from_nibble(nibbles[1]);
        let y = Register::from_nibble(nibbles[2]);
        let nnn = opcode & 0x0fff;
        let nn = opcode as u8;
        let n = nibbles[3];

        match nibbles {
            [0x0, 0x0, 0xe, 0x0] => Self::ClearScreen,
            [0x0, 0x0, 0xe, 0xe] => Self::Return,
            [0x1, _, _, _] => Self::Jump(nnn),
            [0x2, _, _, _] => Self::Call(nnn),
            [0x3, _, _, _] => Self::SkipImmediate(SkipCondition::Equal, x, nn),
            [0x4, _, _, _] => Self::SkipImmediate(SkipCondition::NotEqual, x, nn),
            [0x5, _, _, 0x0] => Self::SkipRegister(SkipCondition::Equal, x, y),
            [0x6, _, _, _] => Self::LoadImmediate(x, nn),
            [0x7, _, _, _] => Self::AddImmediate(x, nn),
            [0x8, _, _, 0x6] => Self::Shift(ShiftDirection::Right, x, y),
            [0x8, _, _, 0xe] => Self::Shift(ShiftDirection::Left, x, y),
            [0x8, _, _, op] => match op {
                0x0 => Self::ArithmeticLogic(ArithmeticLogic::Load, x, y),
                0x1 => Self::ArithmeticLogic(ArithmeticLogic::Or, x, y),
                0x2 => Self::ArithmeticLogic(ArithmeticLogic::And, x, y),
                0x3 => Self::ArithmeticLogic(ArithmeticLogic::Xor, x, y),
                0x4 => Self::ArithmeticLogic(ArithmeticLogic::Add, x, y),
                0x5 => Self::ArithmeticLogic(ArithmeticLogic::Sub, x, y),
                0x7 => Self::ArithmeticLogic(ArithmeticLogic::SubReverse, x, y),
                _ => Self::Invalid(opcode),
            },
            [0x9, _, _, 0x0] => Self::SkipRegister(SkipCondition::NotEqual, x, y),
            [0xa, _, _, _] => Self::LoadIndex(nnn),
            [0xb, _, _, _] => Self::JumpOffset(nnn),
            [0xc, _, _, _] => Self::Random(x, nn),
            [0xd, _, _, _] => Self::Draw(x, y, n),
            [0xe, _, 0x9, 0xe] => Self::SkipKey(KeyCondition::Pressed, x),
            [0xe, _, 0xa, 0x1] => Self::SkipKey(KeyCondition::NotPressed, x),
            [0xf, _, 0x0, 0x7] => Self::ReadDelay(x),
            [0xf, _, 0x0, 0xa] => Self::WaitKey(x),
            [0xf, _, 0x1, 0x5] => Self::SetDelay(x),
            [0xf, _, 0x1, 0x8] => Self::SetSound(x),
            [0xf, _, 0x1, 0xe] => Self::AddIndex(x),
            [0xf, _, 0x2, 0x9] => Self::LoadGlyph(x),
            [0xf, _, 0x3, 0x3] => Self::StoreBcd(x),
            [0xf, _, 0x5, 0x5] => Self::Transfer(TransferDirection::ToMemory, x),
            [0xf, _, 0x6, 0x5] => Self::Transfer(TransferDirection::FromMemory, x),
            _ => Self::Invalid(opcode),
        }
    }
}
