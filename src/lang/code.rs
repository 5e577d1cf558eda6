use crate::{ lang::source_buffer::SourceLocation,
             runtime::data_structures::{ value::Value,
                                         word::WordRef } };
use arcstr::ArcStr;
use std::{ fmt::{ self,
                  Display,
                  Formatter },
           sync::Arc };



/// The body of a compiled word, or of one branch of a control structure.
pub type ActionList = Vec<Action>;



/// One branch of a `CASE` statement.
#[derive(Clone)]
pub struct CaseBranch
{
    /// Pushes the value compared against the selector.
    pub test: ActionList,

    /// Run when the test value matches.
    pub body: ActionList
}



/// The operations a compiled word is made of.  Control structures hold their nested action lists
/// directly, so a word's body is a tree that can be both executed and printed back as source.
#[derive(Clone)]
pub enum Action
{
    /// Push a literal value.
    Push(Value),

    /// Execute a word, recording the location in the source that referenced it.
    Call(WordRef, SourceLocation),

    /// Call the innermost word being executed, its own definition.
    Recurse,

    /// Compile a call to the word into the definition currently being built.  This is the run
    /// time half of `POSTPONE` for a normal word.
    CompileCall(WordRef),

    /// Write text to the output.
    PrintText(ArcStr),

    /// Unconditionally raise an `ABORT"` error with the message.
    AbortText(ArcStr),

    /// Pop a flag, run the then branch if it's true, otherwise the else branch if present.
    If
    {
        then_branch: ActionList,
        else_branch: Option<ActionList>
    },

    /// Run the body then pop a flag, repeating until the flag is true.
    BeginUntil(ActionList),

    /// Run `pre`, pop a flag, if it's true run `mid` and start again.
    BeginWhile
    {
        pre: ActionList,
        mid: ActionList
    },

    /// Run the body forever, only `LEAVE`, `EXIT` or an error gets out.
    BeginAgain(ActionList),

    /// A counted loop.  Pops the start index then the limit.
    DoLoop
    {
        body: ActionList,
        conditional: bool,
        plus_loop: bool
    },

    /// Select a branch by comparing a selector against each branch's test value.
    Case
    {
        branches: Vec<CaseBranch>,
        default: ActionList
    },

    /// Leave the innermost loop.
    Leave,

    /// Return from the current word.
    Exit,

    /// Pop values into a new set of locals, the first name receives the top of the stack.
    BindLocals(Vec<String>),

    /// Push the value of a local.
    FetchLocal(String),

    /// Pop a value into a local.
    StoreLocal(String),

    /// Pop a value into the data cell of a `VALUE`.
    StoreValue(String, usize),

    /// Pop an execution token into a `DEFER`red word.
    SetDeferred(String, usize),

    /// Give the most recently `CREATE`d word the run time behavior that follows `DOES>`.
    SetDoes(Arc<ActionList>)
}


/// Write a list of actions separated by spaces.
fn write_actions(f: &mut Formatter, actions: &ActionList) -> fmt::Result
{
    for ( index, action ) in actions.iter().enumerate()
    {
        if index > 0
        {
            write!(f, " ")?;
        }

        write!(f, "{}", action)?;
    }

    Ok(())
}


/// Write a nested list followed by a space, or nothing for an empty list.
fn write_block(f: &mut Formatter, actions: &ActionList) -> fmt::Result
{
    if !actions.is_empty()
    {
        write_actions(f, actions)?;
        write!(f, " ")?;
    }

    Ok(())
}


/// Print a literal so that evaluating the text pushes the same value again.
fn write_literal(f: &mut Formatter, value: &Value) -> fmt::Result
{
    match value
    {
        Value::Int(value) => write!(f, "{}", value),
        Value::Float(value) => write!(f, "{:?}", value),
        Value::String(text) => write!(f, "S\" {}\"", text),
        Value::Word(word) => write!(f, "['] {}", word.display_name()),
        Value::Task(task) => write!(f, "<task {}>", task.id())
    }
}


/// Decompile the action back into source text.  Re-evaluating the text in a definition builds an
/// action that behaves the same, the text isn't necessarily identical to what was typed.
impl Display for Action
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self
        {
            Action::Push(value) => write_literal(f, value),
            Action::Call(word, _) => write!(f, "{}", word.display_name()),
            Action::Recurse => write!(f, "RECURSE"),
            Action::CompileCall(word) => write!(f, "POSTPONE {}", word.display_name()),
            Action::PrintText(text) => write!(f, ".\" {}\"", text),
            Action::AbortText(text) => write!(f, "ABORT\" {}\"", text),

            Action::If { then_branch, else_branch } =>
                {
                    write!(f, "IF ")?;
                    write_block(f, then_branch)?;

                    if let Some(else_branch) = else_branch
                    {
                        write!(f, "ELSE ")?;
                        write_block(f, else_branch)?;
                    }

                    write!(f, "THEN")
                },

            Action::BeginUntil(body) =>
                {
                    write!(f, "BEGIN ")?;
                    write_block(f, body)?;
                    write!(f, "UNTIL")
                },

            Action::BeginWhile { pre, mid } =>
                {
                    write!(f, "BEGIN ")?;
                    write_block(f, pre)?;
                    write!(f, "WHILE ")?;
                    write_block(f, mid)?;
                    write!(f, "REPEAT")
                },

            Action::BeginAgain(body) =>
                {
                    write!(f, "BEGIN ")?;
                    write_block(f, body)?;
                    write!(f, "AGAIN")
                },

            Action::DoLoop { body, conditional, plus_loop } =>
                {
                    write!(f, "{} ", if *conditional { "?DO" } else { "DO" })?;
                    write_block(f, body)?;
                    write!(f, "{}", if *plus_loop { "+LOOP" } else { "LOOP" })
                },

            Action::Case { branches, default } =>
                {
                    write!(f, "CASE ")?;

                    for branch in branches.iter()
                    {
                        write_block(f, &branch.test)?;
                        write!(f, "OF ")?;
                        write_block(f, &branch.body)?;
                        write!(f, "ENDOF ")?;
                    }

                    write_block(f, default)?;
                    write!(f, "ENDCASE")
                },

            Action::Leave => write!(f, "LEAVE"),
            Action::Exit => write!(f, "EXIT"),

            Action::BindLocals(names) =>
                {
                    write!(f, "LOCALS| ")?;

                    for name in names.iter()
                    {
                        write!(f, "{} ", name)?;
                    }

                    write!(f, "|")
                },

            Action::FetchLocal(name) => write!(f, "{}", name),
            Action::StoreLocal(name) => write!(f, "TO {}", name),
            Action::StoreValue(name, _) => write!(f, "TO {}", name),
            Action::SetDeferred(name, _) => write!(f, "IS {}", name),

            Action::SetDoes(body) =>
                {
                    write!(f, "DOES> ")?;
                    write_actions(f, body)
                }
        }
    }
}


/// Decompile a whole action list into a single line of source text.
pub fn decompile(actions: &ActionList) -> String
{
    actions.iter()
           .map(|action| action.to_string())
           .collect::<Vec<String>>()
           .join(" ")
}



#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn literals_print_as_source()
    {
        let actions = vec![ Action::Push(Value::Int(-3)),
                            Action::Push(Value::from("two words")),
                            Action::PrintText(ArcStr::from("hi")) ];

        assert_eq!(decompile(&actions), "-3 S\" two words\" .\" hi\"");
    }

    #[test]
    fn nested_structures_print_their_closing_words()
    {
        let inner = Action::If { then_branch: vec![ Action::Push(Value::Int(1)) ],
                                 else_branch: Some(vec![]) };
        let actions = vec![ Action::DoLoop { body: vec![ inner, Action::Leave ],
                                             conditional: true,
                                             plus_loop: false } ];

        assert_eq!(decompile(&actions), "?DO IF 1 ELSE THEN LEAVE LOOP");
    }

    #[test]
    fn case_prints_each_branch()
    {
        let actions = vec![ Action::Case { branches: vec![ CaseBranch { test: vec![ Action::Push(Value::Int(5)) ],
                                                                        body: vec![ Action::Push(Value::Int(100)) ] } ],
                                           default: vec![ Action::Push(Value::Int(300)) ] } ];

        assert_eq!(decompile(&actions), "CASE 5 OF 100 ENDOF 300 ENDCASE");
    }
}
