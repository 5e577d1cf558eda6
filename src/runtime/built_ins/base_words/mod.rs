/// Words that manipulate the data and return stacks.
mod stack_words;

/// Words that work with integer math, logic, bit manipulation and comparisons.
mod math_logic_and_bit_words;

/// Words that work with floats.
mod float_words;

/// Words that work with the data space and the words that define data.
mod memory_words;

/// The structured control words.
mod control_words;

/// Words that create new words.
mod word_creation_words;

/// Words that work with words.
pub mod word_words;

/// Words that manage namespaces and the search order.
pub mod search_order_words;

/// CATCH, THROW and the abort words.
mod exception_words;

use crate::runtime::{
    built_ins::base_words::{
        control_words::register_control_words, exception_words::register_exception_words,
        float_words::register_float_words,
        math_logic_and_bit_words::register_math_logic_and_bit_words,
        memory_words::register_memory_words, search_order_words::register_search_order_words,
        stack_words::register_stack_words, word_creation_words::register_word_creation_words,
        word_words::register_word_words,
    },
    interpreter::Interpreter,
};

/// Called to register all of the core words of the language.
pub fn register_base_words(interpreter: &mut dyn Interpreter) {
    register_stack_words(interpreter);
    register_math_logic_and_bit_words(interpreter);
    register_float_words(interpreter);
    register_memory_words(interpreter);
    register_control_words(interpreter);
    register_word_creation_words(interpreter);
    register_word_words(interpreter);
    register_search_order_words(interpreter);
    register_exception_words(interpreter);
}
